mod doc_test;
mod query_test;
