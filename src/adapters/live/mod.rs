//! Live adapters that call real APIs over the network.

pub mod openai;
