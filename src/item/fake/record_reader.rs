use std::cell::Cell;

use fake::{
    Fake, Faker,
    faker::{lorem::en::Words, name::en::Name, time::en::Date},
};
use log::debug;

use crate::{
    core::item::{ItemReader, ItemReaderResult},
    item::record::{Metadata, Record},
};

/// Produces a fixed number of random records with increasing ids.
pub struct RecordReader {
    count: Cell<usize>,
    next_id: Cell<i64>,
}

impl ItemReader<Record> for RecordReader {
    fn read(&self) -> ItemReaderResult<Record> {
        if self.count.get() == 0 {
            return Ok(None);
        }

        self.count.set(self.count.get() - 1);

        let id = self.next_id.get();
        self.next_id.set(id + 1);

        let created: time::Date = Date().fake();

        let record = Record {
            id,
            name: Name().fake(),
            value: (0.0..1000.0).fake::<f64>(),
            tags: Words(0..4).fake(),
            metadata: Metadata {
                created: created.to_string(),
                priority: (1..10).fake::<i64>(),
                active: Faker.fake::<bool>(),
            },
        };
        debug!("Record: {}", record);
        Ok(Some(record))
    }
}

#[derive(Default)]
pub struct RecordReaderBuilder {
    number_of_items: usize,
    first_id: i64,
}

impl RecordReaderBuilder {
    pub fn new() -> RecordReaderBuilder {
        RecordReaderBuilder {
            number_of_items: 0,
            first_id: 1,
        }
    }

    pub fn number_of_items(mut self, number_of_items: usize) -> RecordReaderBuilder {
        self.number_of_items = number_of_items;
        self
    }

    pub fn first_id(mut self, first_id: i64) -> RecordReaderBuilder {
        self.first_id = first_id;
        self
    }

    pub fn build(self) -> RecordReader {
        RecordReader {
            count: self.number_of_items.into(),
            next_id: self.first_id.into(),
        }
    }
}
