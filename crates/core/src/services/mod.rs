pub mod enrichment_service;
pub mod export_service;
pub mod rank_service;
pub mod scoring_service;
