#![allow(dead_code)]

pub mod mock_elastic;
pub mod server;
