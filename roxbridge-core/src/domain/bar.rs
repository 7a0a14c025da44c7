//! Bar records as the host lays them out in memory.

use chrono::{DateTime, NaiveDate, Utc};

/// One fixed-width bar record, field order identical to the host's `STKDATA`.
///
/// Note that `amount` precedes `volume` in the host layout.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StkData {
    /// Date code, `YYYYMMDD` or `(YYYY - 1900) * 10000 + MMDD`.
    pub time: u32,
    pub open: f32,
    pub high: f32,
    pub low: f32,
    pub close: f32,
    pub amount: f32,
    pub volume: f32,
    /// Open interest or unused, depending on the instrument class.
    pub reserved: f32,
}

impl StkData {
    /// Decode the host's date code into a UTC timestamp at midnight.
    ///
    /// Returns `None` for codes in neither supported form.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        decode_date_code(self.time)
    }
}

/// Decode a host date code.
///
/// Two encodings occur in practice: the plain 8-digit `YYYYMMDD` and the
/// 7-digit century-offset form where `1240102` means 2024-01-02.
pub fn decode_date_code(code: u32) -> Option<DateTime<Utc>> {
    let (year, month, day) = match code {
        10_000_000..=99_999_999 => (code / 10_000, (code / 100) % 100, code % 100),
        1_000_000..=9_999_999 => (1900 + code / 10_000, (code / 100) % 100, code % 100),
        _ => return None,
    };
    NaiveDate::from_ymd_opt(year as i32, month, day)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// A borrowed, read-only view over the host's bar array for one invocation.
///
/// The bridge never keeps this past the call it was built in.
#[derive(Debug, Clone, Copy)]
pub struct BarSeries<'a> {
    bars: &'a [StkData],
}

impl<'a> BarSeries<'a> {
    pub fn new(bars: &'a [StkData]) -> Self {
        Self { bars }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// The most recent bar, the only one that changes between host refreshes.
    pub fn last(&self) -> Option<&'a StkData> {
        self.bars.last()
    }

    pub fn as_slice(&self) -> &'a [StkData] {
        self.bars
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn sample_bar(time: u32, close: f32) -> StkData {
        StkData {
            time,
            open: close - 0.1,
            high: close + 0.2,
            low: close - 0.3,
            close,
            amount: close * 1000.0,
            volume: 1000.0,
            reserved: 0.0,
        }
    }

    #[test]
    fn record_is_eight_words_wide() {
        assert_eq!(std::mem::size_of::<StkData>(), 32);
    }

    #[test]
    fn decodes_plain_date_code() {
        let ts = decode_date_code(20240315).unwrap();
        assert_eq!((ts.year(), ts.month(), ts.day()), (2024, 3, 15));
    }

    #[test]
    fn decodes_century_offset_date_code() {
        let ts = decode_date_code(1240102).unwrap();
        assert_eq!((ts.year(), ts.month(), ts.day()), (2024, 1, 2));

        assert!(
            decode_date_code(991231).is_none(),
            "6-digit codes are ambiguous and rejected"
        );
    }

    #[test]
    fn rejects_impossible_dates() {
        assert!(decode_date_code(20241340).is_none());
        assert!(decode_date_code(0).is_none());
    }

    #[test]
    fn series_last_is_newest_bar() {
        let bars = [sample_bar(20240102, 10.0), sample_bar(20240103, 11.0)];
        let series = BarSeries::new(&bars);
        assert_eq!(series.len(), 2);
        assert_eq!(series.last().unwrap().close, 11.0);
        assert!(BarSeries::new(&[]).last().is_none());
    }
}
