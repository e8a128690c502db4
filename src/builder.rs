use crate::{
    error::ValidationError,
    locations::LocationDirectory,
    models::{Occasion, PredictionRequest, Season, TimePeriod},
};

/// Draft of the prediction form.
///
/// Location selections are kept as the raw text the form submitted (an empty
/// string means "nothing selected") and only coerced to integer ids when a
/// request is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PredictionRequestBuilder {
    start_location_id: String,
    end_location_id: String,
    pub time_period: TimePeriod,
    pub occasion: Occasion,
    pub season: Season,
}

impl PredictionRequestBuilder {
    /// Empty selections, `Full_Day` / `Regular` / `Summer`.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_start_location(&mut self, value: impl Into<String>) -> &mut Self {
        self.start_location_id = value.into();
        self
    }

    pub fn set_end_location(&mut self, value: impl Into<String>) -> &mut Self {
        self.end_location_id = value.into();
        self
    }

    pub fn select_start(&mut self, id: i64) -> &mut Self {
        self.set_start_location(id.to_string())
    }

    pub fn select_end(&mut self, id: i64) -> &mut Self {
        self.set_end_location(id.to_string())
    }

    pub fn set_time_period(&mut self, time_period: TimePeriod) -> &mut Self {
        self.time_period = time_period;
        self
    }

    pub fn set_occasion(&mut self, occasion: Occasion) -> &mut Self {
        self.occasion = occasion;
        self
    }

    pub fn set_season(&mut self, season: Season) -> &mut Self {
        self.season = season;
        self
    }

    pub fn start_location(&self) -> &str {
        &self.start_location_id
    }

    pub fn end_location(&self) -> &str {
        &self.end_location_id
    }

    fn parse_id(raw: &str) -> Result<i64, ValidationError> {
        raw.trim()
            .parse::<i64>()
            .map_err(|_| ValidationError::InvalidLocationId(raw.to_string()))
    }

    fn selected_ids(&self) -> Result<(i64, i64), ValidationError> {
        let start = self.start_location_id.trim();
        let end = self.end_location_id.trim();
        if start.is_empty() || end.is_empty() {
            return Err(ValidationError::MissingSelection);
        }
        let start = Self::parse_id(start)?;
        let end = Self::parse_id(end)?;
        if start == end {
            return Err(ValidationError::SameLocation);
        }
        Ok((start, end))
    }

    /// Check the draft without building a request.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.selected_ids().map(|_| ())
    }

    /// Produce a well-formed request from a valid draft.
    pub fn build(&self) -> Result<PredictionRequest, ValidationError> {
        let (start_location_id, end_location_id) = self.selected_ids()?;
        Ok(PredictionRequest {
            start_location_id,
            end_location_id,
            time_period: self.time_period,
            occasion: self.occasion,
            season: self.season,
        })
    }

    /// Like [`build`](Self::build), additionally requiring both ids to be
    /// present in `directory`.
    pub fn build_for(
        &self,
        directory: &LocationDirectory,
    ) -> Result<PredictionRequest, ValidationError> {
        let request = self.build()?;
        for id in [request.start_location_id, request.end_location_id] {
            if !directory.contains(id) {
                return Err(ValidationError::UnknownLocation(id));
            }
        }
        Ok(request)
    }
}
