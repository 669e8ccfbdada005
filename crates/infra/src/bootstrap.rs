//! Service wiring from configuration.

use std::sync::Arc;

use calarm_common::Clock;
use calarm_core::{
    AlarmStore, CalculatorSettings, NextAlarmCalculator, ReconciliationService,
};
use calarm_domain::{CalarmError, Config, Result, StoreBackend};
use chrono_tz::Tz;
use tracing::info;

use crate::database::{DbManager, SqliteAlarmStore};
use crate::memory::InMemoryAlarmStore;
use crate::policy::build_policy;
use crate::recurrence::RRuleExpander;

/// A ready-to-use reconciler plus the store it writes to.
///
/// The store handle is what a delivery loop polls with
/// `find_due_before`.
pub struct AlarmRuntime {
    pub service: ReconciliationService,
    pub store: Arc<dyn AlarmStore>,
}

/// Build the store, expander, policy gate and reconciliation service.
///
/// # Errors
/// - `CalarmError::Config` for an unknown default timezone.
/// - `CalarmError::Database` when the SQLite store cannot be opened or
///   migrated.
pub fn build_reconciler(config: &Config, clock: Arc<dyn Clock>) -> Result<AlarmRuntime> {
    let default_tz: Tz = config.scheduling.default_timezone.parse().map_err(|e| {
        CalarmError::Config(format!(
            "Invalid default timezone '{}': {e}",
            config.scheduling.default_timezone
        ))
    })?;

    let store = build_store(config, Arc::clone(&clock))?;
    let settings = CalculatorSettings::from_config(&config.scheduling);
    let calculator = NextAlarmCalculator::new(Arc::new(RRuleExpander::new()), Arc::clone(&clock))
        .with_settings(settings);
    let service = ReconciliationService::new(
        calculator,
        Arc::clone(&store),
        build_policy(&config.policy),
        clock,
    )
    .with_default_timezone(default_tz);

    info!(
        backend = %config.store.backend,
        default_tz = %default_tz,
        lookahead_days = config.scheduling.lookahead_days,
        "alarm reconciler ready"
    );

    Ok(AlarmRuntime { service, store })
}

fn build_store(config: &Config, clock: Arc<dyn Clock>) -> Result<Arc<dyn AlarmStore>> {
    match config.store.backend {
        StoreBackend::Memory => Ok(Arc::new(InMemoryAlarmStore::new())),
        StoreBackend::Sqlite => {
            let db = DbManager::new(&config.store.path, config.store.pool_size)?;
            db.run_migrations()?;
            Ok(Arc::new(SqliteAlarmStore::new(Arc::new(db)).with_clock(clock)))
        }
    }
}
