pub mod http_result_relay;
