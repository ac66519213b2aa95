use std::fmt::Debug;

use log::info;

use crate::core::item::{ItemHandler, ItemHandlerResult};

/// Handler that logs every item it receives.
#[derive(Default)]
pub struct LoggerHandler {}

impl LoggerHandler {
    pub fn new() -> Self {
        Self {}
    }
}

impl<T> ItemHandler<T> for LoggerHandler
where
    T: Debug,
{
    fn handle(&self, item: &T) -> ItemHandlerResult {
        info!("Record:{:?}", item);
        Ok(())
    }
}
