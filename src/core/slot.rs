//! Shared slot carrying the latest successful particulate reading.
//!
//! The only mutable state shared between concurrent activities. One writer
//! (the background reader), any number of readers (the aggregator). A store
//! is an atomic replace, never an in-place mutation, so a reader observes
//! either the initial absent state or some complete reading.

use tokio::sync::watch;

use super::reading::ParticulateReading;

/// Writer half, owned by the particulate background reader.
#[derive(Debug)]
pub struct SlotWriter {
    tx: watch::Sender<Option<ParticulateReading>>,
}

/// Reader half. Cloneable; reads never block.
#[derive(Debug, Clone)]
pub struct SlotReader {
    rx: watch::Receiver<Option<ParticulateReading>>,
}

/// Creates an empty slot.
pub fn slot() -> (SlotWriter, SlotReader) {
    let (tx, rx) = watch::channel(None);
    (SlotWriter { tx }, SlotReader { rx })
}

impl SlotWriter {
    pub fn store(&self, reading: ParticulateReading) {
        // Send only fails when every reader is gone, which is harmless here.
        let _ = self.tx.send(Some(reading));
    }
}

impl SlotReader {
    /// The most recently stored reading, or `None` before the first
    /// successful read. Absence is a normal state, not an error.
    pub fn latest(&self) -> Option<ParticulateReading> {
        *self.rx.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(pm25: u32) -> ParticulateReading {
        ParticulateReading {
            pm1: 1,
            pm25,
            pm10: 10,
            pl03: 100,
            pl05: 50,
            pl1: 10,
            pl25: 5,
            pl5: 2,
            pl10: 1,
        }
    }

    #[test]
    fn slot_starts_absent() {
        let (_writer, reader) = slot();
        assert_eq!(reader.latest(), None);
    }

    #[test]
    fn reads_observe_the_freshest_store() {
        let (writer, reader) = slot();

        writer.store(reading(5));
        assert_eq!(reader.latest().unwrap().pm25, 5);

        writer.store(reading(7));
        assert_eq!(reader.latest().unwrap().pm25, 7);
        // A newer value never regresses to an older one.
        assert_eq!(reader.latest().unwrap().pm25, 7);
    }

    #[test]
    fn readers_are_independent_clones() {
        let (writer, reader) = slot();
        let other = reader.clone();

        writer.store(reading(3));
        assert_eq!(reader.latest().unwrap().pm25, 3);
        assert_eq!(other.latest().unwrap().pm25, 3);
    }

    #[test]
    fn store_without_readers_is_harmless() {
        let (writer, reader) = slot();
        drop(reader);
        writer.store(reading(1));
    }
}
