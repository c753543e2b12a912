//! # Engine
//!
//! Bundles a [`ReferenceLookup`] with the [`EngineSettings`] every
//! calculator reads, so a front end constructs one value and hands it
//! [`CalculationItem`]s.
//!
//! ## Example
//!
//! ```rust
//! use calc_core::calculations::{CalculationItem, CalculationOutput};
//! use calc_core::engine::Engine;
//! use calc_core::settings::EngineSettings;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let engine = Engine::bundled(EngineSettings::default()).unwrap();
//! let item: CalculationItem = serde_json::from_str(
//!     r#"{"type": "Resistance", "connection": "parallel", "resistors": [100, 100]}"#,
//! ).unwrap();
//!
//! let report = engine.report(&item).await;
//! match report.output {
//!     Some(CalculationOutput::Resistance(result)) => assert_eq!(result.total_ohms, 50.0),
//!     _ => panic!("expected a resistance result"),
//! }
//! # });
//! ```

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::calculations::{calculate_item, CalculationItem, CalculationOutput, CalculationReport};
use crate::errors::CalcResult;
use crate::reference::{MemoryReferenceStore, ReferenceLookup, ReferenceStore};
use crate::session::{run_guarded, CalculationSession};
use crate::settings::EngineSettings;

/// Lookup layer plus settings, shared cheaply between tasks.
pub struct Engine<S> {
    lookup: ReferenceLookup<S>,
    settings: Arc<EngineSettings>,
}

impl<S> Clone for Engine<S> {
    fn clone(&self) -> Self {
        Engine {
            lookup: self.lookup.clone(),
            settings: Arc::clone(&self.settings),
        }
    }
}

impl Engine<MemoryReferenceStore> {
    /// Engine over the bundled reference tables.
    pub fn bundled(settings: EngineSettings) -> CalcResult<Self> {
        Ok(Engine::new(ReferenceLookup::bundled()?, settings))
    }
}

impl<S: ReferenceStore + 'static> Engine<S> {
    pub fn new(lookup: ReferenceLookup<S>, settings: EngineSettings) -> Self {
        Engine {
            lookup,
            settings: Arc::new(settings),
        }
    }

    pub fn lookup(&self) -> &ReferenceLookup<S> {
        &self.lookup
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub async fn calculate(&self, item: &CalculationItem) -> CalcResult<CalculationOutput> {
        calculate_item(item, &self.lookup, &self.settings).await
    }

    /// Run a calculation and fold its error, if any, into the report.
    ///
    /// The calculation runs on its own task, so a calculator that panics
    /// yields a report carrying [`CalcError::Internal`](crate::errors::CalcError::Internal).
    pub async fn report(&self, item: &CalculationItem) -> CalculationReport {
        let engine = self.clone();
        let owned = item.clone();
        let result = run_guarded(async move { engine.calculate(&owned).await }).await;
        if let Err(e) = &result {
            tracing::info!(calc_type = item.calc_type(), code = e.error_code(), error = %e, "calculation rejected");
        }
        CalculationReport::new(item, &self.settings, result)
    }

    /// Submit a calculation to a session; the newest submission wins.
    pub fn submit(&self, session: &CalculationSession<CalculationOutput>, item: CalculationItem) -> JoinHandle<bool> {
        let engine = self.clone();
        session.submit(async move { engine.calculate(&item).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::parse_form;
    use std::collections::BTreeMap;

    fn form(name: &str, pairs: &[(&str, &str)]) -> CalculationItem {
        let fields: BTreeMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        parse_form(name, &fields).unwrap()
    }

    #[tokio::test]
    async fn test_settings_reach_calculators() {
        let settings = EngineSettings::from_toml_str("[dwelling]\nservice_voltage = 120.0").unwrap();
        let engine = Engine::bundled(settings).unwrap();
        let item = form("dwelling_load", &[("floor_area", "1000")]);
        match engine.calculate(&item).await.unwrap() {
            CalculationOutput::DwellingLoad(result) => assert_eq!(result.service_voltage, 120.0),
            other => panic!("unexpected output {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_session_keeps_newest() {
        let engine = Engine::bundled(EngineSettings::default()).unwrap();
        let session = CalculationSession::new();

        let first = form("resistance", &[("resistors", "1, 2")]);
        let second = form("resistance", &[("resistors", "1, 2, 3")]);
        engine.submit(&session, first).await.unwrap();
        engine.submit(&session, second).await.unwrap();

        let latest = session.latest().unwrap();
        assert_eq!(latest.generation, 2);
        match latest.result.unwrap() {
            CalculationOutput::Resistance(result) => assert_eq!(result.total_ohms, 6.0),
            other => panic!("unexpected output {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_report_for_lookup_miss() {
        let engine = Engine::bundled(EngineSettings::default()).unwrap();
        let item = form(
            "ampacity",
            &[("material", "al"), ("size", "14"), ("insulation_rating", "75")],
        );
        let report = engine.report(&item).await;
        assert!(report.output.is_none());
        assert!(report.error.unwrap().is_lookup_miss());
    }

    #[tokio::test]
    async fn test_report_survives_calculator_panic() {
        let engine = Engine::bundled(EngineSettings::default()).unwrap();
        let item = form("resistance", &[("resistors", "10, 10")]);

        // Same boundary `report` uses, fed a calculation that panics.
        let owned = item.clone();
        let result = run_guarded(async move {
            let rows: Vec<u32> = Vec::new();
            let _ = rows[rows.len() + 2];
            engine.calculate(&owned).await
        })
        .await;
        let report = CalculationReport::new(&item, &EngineSettings::default(), result);
        assert!(report.output.is_none());
        assert_eq!(report.error.unwrap().error_code(), "INTERNAL_ERROR");

        let engine = Engine::bundled(EngineSettings::default()).unwrap();
        let report = engine.report(&item).await;
        assert!(report.is_ok());
        match report.output.unwrap() {
            CalculationOutput::Resistance(result) => assert_eq!(result.total_ohms, 5.0),
            other => panic!("unexpected output {:?}", other),
        }
    }
}
