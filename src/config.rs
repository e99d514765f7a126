use std::env::var;

use dotenvy::dotenv;

use crate::infrastructure::messaging::jetstream::JetstreamConfig;

pub struct Config {
    pub nats_url: String,
    pub host_region: String,
    pub pull_batch: usize,
    pub ack_wait_seconds: u64,
    pub max_deliver: i64,
}

impl Config {
    pub fn try_parse() -> Result<Config, &'static str> {
        let _ = dotenv();

        Ok(Config {
            nats_url: var("NATS_URL")
                .map_err(|_| "An error occured while getting NATS_URL env param")?,
            host_region: var("HOST_REGION").unwrap_or_else(|_| "unknown".to_string()),
            pull_batch: var("PULL_BATCH")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(10),
            ack_wait_seconds: var("ACK_WAIT_SECONDS")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(30),
            max_deliver: var("MAX_DELIVER")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(5),
        })
    }

    pub fn sms_queue(&self) -> JetstreamConfig {
        self.queue("smses")
    }

    pub fn email_queue(&self) -> JetstreamConfig {
        self.queue("emails")
    }

    fn queue(&self, name: &str) -> JetstreamConfig {
        JetstreamConfig {
            url: self.nats_url.clone(),
            stream: format!("ancillary_{name}"),
            subject: format!("ancillary.{name}"),
            durable: format!("ancillary_{name}_worker"),
            pull_batch: self.pull_batch,
            ack_wait_seconds: self.ack_wait_seconds,
            max_deliver: self.max_deliver,
        }
    }
}
