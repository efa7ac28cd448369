use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::engine::error::{EngineError, not_found};

/// Closed catalog of supported failure scenarios. Unknown keys fail fast
/// with `NotFound` rather than falling back to a default scenario; silent
/// substitution would corrupt the verdict's meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    PrimaryDbFailure,
    ReplicaLag,
    BackupFailure,
    StoragePressure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScenarioDescriptor {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    /// Narrative fragment injected verbatim into the rendered instruction.
    pub prompt_section: &'static str,
    pub tags: &'static [&'static str],
}

impl Scenario {
    pub fn all() -> &'static [Scenario] {
        &[
            Scenario::PrimaryDbFailure,
            Scenario::ReplicaLag,
            Scenario::BackupFailure,
            Scenario::StoragePressure,
        ]
    }

    pub fn key(&self) -> &'static str {
        self.describe().key
    }

    pub fn describe(&self) -> ScenarioDescriptor {
        match self {
            Scenario::PrimaryDbFailure => PRIMARY_DB_FAILURE,
            Scenario::ReplicaLag => REPLICA_LAG,
            Scenario::BackupFailure => BACKUP_FAILURE,
            Scenario::StoragePressure => STORAGE_PRESSURE,
        }
    }
}

impl FromStr for Scenario {
    type Err = EngineError;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        match key {
            "primary_db_failure" => Ok(Scenario::PrimaryDbFailure),
            "replica_lag" => Ok(Scenario::ReplicaLag),
            "backup_failure" => Ok(Scenario::BackupFailure),
            "storage_pressure" => Ok(Scenario::StoragePressure),
            other => Err(not_found(format!("unknown scenario '{other}'"))),
        }
    }
}

impl std::fmt::Display for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

const PRIMARY_DB_FAILURE: ScenarioDescriptor = ScenarioDescriptor {
    key: "primary_db_failure",
    name: "Primary Database Failure",
    description: "Impact when the primary DB instance fails completely (hardware failure, AZ outage, or critical error)",
    prompt_section: "\
SCENARIO: Primary database instance has failed completely (hardware failure, AZ outage, or critical error).

ANALYSIS REQUIRED:
1. Check Multi-AZ configuration to determine failover capability:
   - Multi-AZ ENABLED: automatic failover to a standby in a different AZ.
     Historical data shows Multi-AZ failovers complete in under 5 minutes.
     Estimate RTO of 3-5 minutes; no data loss (synchronous replication).
   - Multi-AZ DISABLED: manual recovery via snapshot restore.
     Historical restores take 60-120 minutes depending on instance class.
     Data loss equals time since the last backup when PITR is disabled.
2. Assess RPO from the backup configuration:
   - PITR ENABLED: restore to any second within retention; data loss is
     seconds to minutes.
   - PITR DISABLED: restore only to snapshot time; data loss can reach
     hours up to a full day depending on when the failure occurred.
3. Compare the estimated recovery time against the RTO policy.
   Multi-AZ disabled with an RTO policy under 30 minutes is an RTO violation.
4. Compare the estimated data loss against the RPO policy.
   PITR disabled with an RPO policy under 1 hour is a likely RPO violation.

CRITICAL QUESTIONS TO ANSWER:
- Will this failure violate SLA thresholds based on expected downtime?
- Does the estimated RTO exceed the acceptable recovery time from the RTO policy?
- Does the estimated RPO exceed the acceptable data loss from the RPO policy?
- What is the database-level severity given Multi-AZ, PITR, business
  criticality from the SLA policies, and historical incident patterns?

RECOMMENDATIONS (prioritize by impact):
- If Multi-AZ disabled: enable Multi-AZ to reduce RTO from 60-90 min to under 5 min.
- If PITR disabled: enable PITR to reduce RPO from hours to seconds.
- If backup retention is under 7 days and compliance requirements exist: increase retention.
- If the instance class is small: consider a larger class for faster restore.",
    tags: &["availability", "disaster-recovery", "critical"],
};

const REPLICA_LAG: ScenarioDescriptor = ScenarioDescriptor {
    key: "replica_lag",
    name: "Read Replica Lag",
    description: "Impact when read replicas fall significantly behind the primary (more than 5 minutes)",
    prompt_section: "\
SCENARIO: Read replicas are experiencing significant replication lag (more than 5 minutes behind the primary).

ANALYSIS REQUIRED:
1. Check the read replica configuration. A single replica means all read
   traffic is affected when it lags; multiple replicas can route around a
   lagging one.
2. Assess the impact of stale data: read-heavy workloads receive data more
   than 5 minutes old, writes to the primary are NOT affected, and
   applications reading from replicas may show inconsistent results.
3. Review historical incident data for past replica lag events and their
   resolution times. Absent history, lag typically resolves in 10-30
   minutes depending on the cause.
4. Evaluate severity against business policies: an SLA requiring real-time
   or near-real-time reads makes this an SLA violation; analytics or
   development workloads tolerate staleness.
5. Availability is not directly affected: the primary keeps accepting
   writes, so this is typically MEDIUM severity unless the business
   requires real-time reads.

CRITICAL QUESTIONS TO ANSWER:
- Does the lag duration violate data consistency commitments in the SLA?
- What is the database-level severity given replica count, data freshness
  requirements, and historical resolution times?
- Will applications fail or show incorrect data due to staleness?

RECOMMENDATIONS:
- If a single replica: add replicas for redundancy.
- If sustained: investigate primary load and optimize heavy queries.
- If recurring: scale the replica instance class vertically.
- If the business requires real-time reads: route critical reads to the primary.
- Alert on replication lag at a 2-minute threshold.",
    tags: &["performance", "read-scaling", "data-consistency"],
};

const BACKUP_FAILURE: ScenarioDescriptor = ScenarioDescriptor {
    key: "backup_failure",
    name: "Backup Failure",
    description: "Impact when automated backups fail or the latest backup is corrupted and unusable",
    prompt_section: "\
SCENARIO: Automated database backups have failed, or the latest backup is corrupted and unusable.

ANALYSIS REQUIRED:
1. Assess current exposure if the primary fails NOW: without a recent
   backup, recovery falls back to an older one and data loss equals the
   time since the last known-good backup. PITR transaction logs partially
   mitigate this; without PITR the loss is total back to that backup.
2. Calculate the maximum data loss exposure (RPO) from the retention
   window and compare it against the RPO policy threshold.
3. Evaluate recovery capability: Multi-AZ still provides failover but does
   not protect against data corruption. A primary failure combined with an
   unusable backup and no PITR is a catastrophic data loss scenario.
4. Check compliance exposure: backup failures may violate regulatory
   requirements documented in the business policies.
5. Severity guidance: CRITICAL for a production database without PITR and
   a strict RPO policy; HIGH when PITR still provides recovery points;
   MEDIUM for non-production databases with recent backups.

CRITICAL QUESTIONS TO ANSWER:
- What is the maximum potential data loss if the primary fails right now?
- Does this failure violate backup or recovery commitments in the policies?
- Are alternative recovery mechanisms available (PITR, read replicas)?

RECOMMENDATIONS (prioritize by urgency):
- URGENT: investigate and fix the backup failure immediately.
- If PITR disabled: enable PITR as a safety net while backups are repaired.
- If compliance-critical: notify the compliance owner and document the incident.
- If retention is under 7 days: widen the recovery window.
- Alert on the first backup failure and test restores regularly.",
    tags: &["disaster-recovery", "compliance", "data-protection", "critical"],
};

const STORAGE_PRESSURE: ScenarioDescriptor = ScenarioDescriptor {
    key: "storage_pressure",
    name: "Storage Pressure",
    description: "Impact when storage utilization reaches 85%+ of allocated capacity",
    prompt_section: "\
SCENARIO: Database storage utilization has reached 85% or more of allocated capacity.

ANALYSIS REQUIRED:
1. Calculate the remaining headroom from the allocated storage. If a
   maximum allocated storage is configured above the current allocation,
   autoscaling will expand before exhaustion; if it is absent or already
   reached, manual intervention is required.
2. Estimate urgency: at 85% utilization expect days to weeks until
   exhaustion, not hours. 90%+ utilization is critical.
3. Assess the impact at 100%: write operations fail, the database may
   become unresponsive, transaction logs can fill and break replication,
   and backups may fail for lack of snapshot space.
4. Evaluate against availability policies: storage exhaustion is an outage
   and therefore an SLA violation; manual expansion takes 15-30 minutes,
   autoscaling expands seamlessly with no expected outage.

CRITICAL QUESTIONS TO ANSWER:
- Will storage exhaustion cause an outage and write failures?
- Does this violate availability commitments in the SLA?
- Is autoscaling configured, or is manual intervention required?

RECOMMENDATIONS (prioritize by urgency):
- If no maximum allocated storage is set: enable storage autoscaling with
  a ceiling of 2-3x the current allocation.
- If already at the ceiling: raise the ceiling or migrate to larger storage.
- If 90%+ utilized: expand manually now rather than waiting for autoscaling.
- Long term: alert at 70% utilization and investigate growth patterns.",
    tags: &["capacity", "availability", "operational"],
};
