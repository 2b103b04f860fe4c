use std::sync::Arc;

use crate::{
    aggregate::AggregateStore,
    catalog::Catalog,
    config::Config,
    filter::ContentFilter,
    qc::QcPipeline,
    qc_log::QcLog,
    query::QueryService,
};

pub struct AppState {
    pub config: Config,
    pub pipeline: QcPipeline,
    pub query: QueryService,
}

impl AppState {
    pub fn new() -> Arc<Self> {
        let config = Config::load();

        let catalog = Arc::new(match &config.catalog_path {
            Some(path) => Catalog::load(path),
            None => Catalog::seed(),
        });
        let filter = ContentFilter::new(config.comment_max, &config.denylist);
        let aggregates = Arc::new(AggregateStore::new());
        let log = Arc::new(QcLog::new());

        let pipeline = QcPipeline::new(catalog.clone(), filter, aggregates.clone(), log.clone());
        let query = QueryService::new(catalog, aggregates, log);

        Arc::new(Self {
            config,
            pipeline,
            query,
        })
    }
}
