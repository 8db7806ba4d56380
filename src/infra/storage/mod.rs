pub mod local_result_store;
