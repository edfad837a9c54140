/// Region, category and job identifiers are opaque strings issued by the API.
pub type RegionId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Calendar dates (preferred visit date) carry no time zone.
pub type Date = chrono::NaiveDate;
