use prometheus::{
    register_histogram_vec, register_int_counter_vec, HistogramVec, IntCounterVec,
};

lazy_static::lazy_static! {
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "postal_search_http_requests_total", "Total HTTP requests", &["method", "path", "status"]
    ).unwrap();
    pub static ref SEARCHES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "postal_search_searches_total", "Term searches", &["outcome"]
    ).unwrap();
    pub static ref SEARCH_HITS: HistogramVec = register_histogram_vec!(
        "postal_search_search_hits", "Hits returned per term search", &["index"],
        vec![0.0, 1.0, 2.0, 5.0, 10.0]
    ).unwrap();
    pub static ref DOCUMENT_WRITES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "postal_search_document_writes_total", "Document writes", &["operation"]
    ).unwrap();
    pub static ref BACKEND_OPERATION_DURATION: HistogramVec = register_histogram_vec!(
        "postal_search_backend_operation_duration_seconds", "Search backend request latency",
        &["operation"],
        vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    ).unwrap();
    pub static ref BACKEND_ERRORS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "postal_search_backend_errors_total", "Search backend request errors", &["operation"]
    ).unwrap();
}

pub fn init() {
    lazy_static::initialize(&HTTP_REQUESTS_TOTAL);
    lazy_static::initialize(&SEARCHES_TOTAL);
    lazy_static::initialize(&SEARCH_HITS);
    lazy_static::initialize(&DOCUMENT_WRITES_TOTAL);
    lazy_static::initialize(&BACKEND_OPERATION_DURATION);
    lazy_static::initialize(&BACKEND_ERRORS_TOTAL);
}
