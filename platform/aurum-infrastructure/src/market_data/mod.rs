pub mod http_feed;
