pub mod accrual_service;
pub mod rate_archive;
pub mod statement_service;
pub mod valuation_service;
