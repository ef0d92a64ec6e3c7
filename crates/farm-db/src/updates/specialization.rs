//! Cheese, wool and soap update builders.

use farm_core::enums::{ConservationMode, FabricationType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheeseUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ferment_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ferment_quantity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ferment_measure_unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooking_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooking_temperature: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refining_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refining_temperature: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pressing: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pressing_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conservation_mode: Option<ConservationMode>,
}

#[derive(Default)]
pub struct CheeseUpdateBuilder(CheeseUpdate);

impl CheeseUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn ferment(mut self, name: impl Into<String>, quantity: f64, unit: impl Into<String>) -> Self {
        self.0.ferment_name = Some(name.into());
        self.0.ferment_quantity = Some(quantity);
        self.0.ferment_measure_unit = Some(unit.into());
        self
    }

    #[must_use]
    pub fn cooking(mut self, time: i64, temperature: i64) -> Self {
        self.0.cooking_time = Some(time);
        self.0.cooking_temperature = Some(temperature);
        self
    }

    #[must_use]
    pub fn refining(mut self, time: i64, temperature: i64) -> Self {
        self.0.refining_time = Some(time);
        self.0.refining_temperature = Some(temperature);
        self
    }

    #[must_use]
    pub fn pressing(mut self, pressing: bool, time: i64) -> Self {
        self.0.pressing = Some(pressing);
        self.0.pressing_time = Some(time);
        self
    }

    #[must_use]
    pub fn conservation_mode(mut self, val: ConservationMode) -> Self {
        self.0.conservation_mode = Some(val);
        self
    }

    #[must_use]
    pub fn build(self) -> CheeseUpdate {
        self.0
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WoolUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fabrication_type: Option<FabricationType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dyeing: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dyeing_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dyeing_preparation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drying_time: Option<i64>,
}

#[derive(Default)]
pub struct WoolUpdateBuilder(WoolUpdate);

impl WoolUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn fabrication_type(mut self, val: FabricationType) -> Self {
        self.0.fabrication_type = Some(val);
        self
    }

    #[must_use]
    pub fn dyeing(mut self, dyeing: bool, color: impl Into<String>, preparation: impl Into<String>) -> Self {
        self.0.dyeing = Some(dyeing);
        self.0.dyeing_color = Some(color.into());
        self.0.dyeing_preparation = Some(preparation.into());
        self
    }

    #[must_use]
    pub fn drying_time(mut self, val: i64) -> Self {
        self.0.drying_time = Some(val);
        self
    }

    #[must_use]
    pub fn build(self) -> WoolUpdate {
        self.0
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SoapUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drying_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dyeing: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dyeing_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dyeing_preparation: Option<String>,
}

#[derive(Default)]
pub struct SoapUpdateBuilder(SoapUpdate);

impl SoapUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn drying_time(mut self, val: i64) -> Self {
        self.0.drying_time = Some(val);
        self
    }

    #[must_use]
    pub fn dyeing(mut self, dyeing: bool, color: impl Into<String>, preparation: impl Into<String>) -> Self {
        self.0.dyeing = Some(dyeing);
        self.0.dyeing_color = Some(color.into());
        self.0.dyeing_preparation = Some(preparation.into());
        self
    }

    #[must_use]
    pub fn build(self) -> SoapUpdate {
        self.0
    }
}
