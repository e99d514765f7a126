use std::io::Error;
use std::sync::Arc;

use tokio::main;
use tracing::info;

use ancillary::application::channels::{EmailChannel, SmsChannel};
use ancillary::application::services::id_factory::UuidIdFactory;
use ancillary::application::usecases::dispatch_delivery::DispatchDeliveryUseCase;
use ancillary::config::Config;
use ancillary::domain::value_objects::DatacenterLocation;
use ancillary::infrastructure::messaging::jetstream::JetstreamWorker;
use ancillary::infrastructure::repositories::in_memory::{
    InMemoryEmailDeliveryRepository, InMemorySmsDeliveryRepository,
};
use ancillary::infrastructure::transports::logging::{LoggingEmailTransport, LoggingSmsTransport};

#[main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt().init();

    let config = Config::try_parse().map_err(Error::other)?;
    let host_region = DatacenterLocation::new(config.host_region.clone());
    let id_factory = Arc::new(UuidIdFactory);

    let sms_dispatcher = Arc::new(DispatchDeliveryUseCase::<SmsChannel>::new(
        Arc::new(InMemorySmsDeliveryRepository::new()),
        Arc::new(LoggingSmsTransport),
        id_factory.clone(),
        host_region.clone(),
    ));
    let email_dispatcher = Arc::new(DispatchDeliveryUseCase::<EmailChannel>::new(
        Arc::new(InMemoryEmailDeliveryRepository::new()),
        Arc::new(LoggingEmailTransport),
        id_factory,
        host_region.clone(),
    ));

    let sms_worker = JetstreamWorker::new(&config.sms_queue(), sms_dispatcher)
        .await
        .map_err(Error::other)?;
    let email_worker = JetstreamWorker::new(&config.email_queue(), email_dispatcher)
        .await
        .map_err(Error::other)?;

    let sms_handle = sms_worker.spawn();
    let email_handle = email_worker.spawn();
    info!(region = host_region.code(), "delivery workers started");

    tokio::signal::ctrl_c().await?;
    sms_handle.abort();
    email_handle.abort();
    Ok(())
}
