// Document number generation: PREFIX-YYYYMM-NNNN with a monthly reset.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::Mutex;

use pawledger::core::Result;
use pawledger::modules::sequences::{DocumentFamily, NumberSource, SequenceGenerator};

/// Number source backed by a plain list, standing in for a repository
struct ListSource {
    numbers: Mutex<Vec<String>>,
}

impl ListSource {
    fn new(numbers: &[&str]) -> Self {
        Self {
            numbers: Mutex::new(numbers.iter().map(|s| s.to_string()).collect()),
        }
    }

    fn push(&self, number: &str) {
        self.numbers.lock().unwrap().push(number.to_string());
    }
}

#[async_trait]
impl NumberSource for ListSource {
    async fn latest_number(&self, prefix: &str) -> Result<Option<String>> {
        Ok(self
            .numbers
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.starts_with(prefix))
            .max()
            .cloned())
    }
}

fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
}

#[tokio::test]
async fn test_numbers_are_sequential_within_a_month() {
    let source = ListSource::new(&[]);
    let generator = SequenceGenerator::new();

    for expected in ["SAL-202507-0001", "SAL-202507-0002", "SAL-202507-0003"] {
        let number = generator
            .next_number(&source, DocumentFamily::Sale, at(2025, 7, 10))
            .await
            .unwrap();
        assert_eq!(number, expected);
        source.push(&number);
    }
}

#[tokio::test]
async fn test_sequence_resets_each_month() {
    let source = ListSource::new(&["INV-202506-0041", "INV-202506-0042"]);
    let generator = SequenceGenerator::new();

    let june = generator
        .next_number(&source, DocumentFamily::Invoice, at(2025, 6, 30))
        .await
        .unwrap();
    assert_eq!(june, "INV-202506-0043");

    let july = generator
        .next_number(&source, DocumentFamily::Invoice, at(2025, 7, 1))
        .await
        .unwrap();
    assert_eq!(july, "INV-202507-0001");
}

#[tokio::test]
async fn test_families_do_not_share_sequences() {
    let source = ListSource::new(&["SAL-202507-0009"]);
    let generator = SequenceGenerator::new();

    // An invoice sequence is untouched by existing sale numbers
    let number = generator
        .next_number(&source, DocumentFamily::Invoice, at(2025, 7, 2))
        .await
        .unwrap();
    assert_eq!(number, "INV-202507-0001");
}

#[tokio::test]
async fn test_zero_padding_is_four_digits() {
    let source = ListSource::new(&["SAL-202507-0099"]);
    let generator = SequenceGenerator::new();

    let number = generator
        .next_number(&source, DocumentFamily::Sale, at(2025, 7, 2))
        .await
        .unwrap();
    assert_eq!(number, "SAL-202507-0100");
}
