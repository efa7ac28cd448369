use crate::engine::types::{AnalysisContext, ConfigurationSnapshot};

/// Renders the full instruction for one analysis context.
///
/// Deterministic by construction: the output is a pure function of the
/// context fields, so identical contexts yield byte-identical text. The
/// rest of the pipeline's reliability rests on this instruction being
/// unambiguous enough that the inference step's non-determinism is confined
/// to wording, not schema.
pub fn render_instruction(context: &AnalysisContext) -> String {
    let descriptor = context.scenario.describe();
    format!(
        concat!(
            "You are an expert Site Reliability Engineer analyzing database failure scenarios.\n\n",
            "TASK:\n",
            "Assess the impact if database \"{identifier}\" experiences: {scenario_name}.\n\n",
            "You must answer these critical questions:\n",
            "1. sla_violation: Will this failure breach our SLA commitments? (true/false)\n",
            "2. rto_violation: Will recovery time exceed our RTO policy? (true/false)\n",
            "3. rpo_violation: Will data loss exceed our RPO policy? (true/false)\n",
            "4. expected_outage_time_minutes: How long will we be down? (non-negative integer)\n",
            "5. business_severity: How critical is this? (LOW/MEDIUM/HIGH/CRITICAL)\n\n",
            "{scenario_section}\n\n",
            "---\n",
            "DATABASE CONFIGURATION:\n",
            "{snapshot}\n",
            "---\n",
            "BUSINESS POLICIES & HISTORICAL DATA:\n",
            "{policy}\n",
            "---\n",
            "OUTPUT REQUIREMENTS:\n\n",
            "Return ONLY a single valid JSON object matching this exact schema:\n\n",
            "{{\n",
            "  \"sla_violation\": boolean,\n",
            "  \"rto_violation\": boolean,\n",
            "  \"rpo_violation\": boolean,\n",
            "  \"expected_outage_time_minutes\": non-negative integer,\n",
            "  \"business_severity\": \"LOW\" | \"MEDIUM\" | \"HIGH\" | \"CRITICAL\",\n",
            "  \"why\": [non-empty array of non-empty strings explaining your reasoning],\n",
            "  \"recommendations\": [non-empty array of non-empty strings with actionable fixes],\n",
            "  \"confidence\": number between 0.0 and 1.0\n",
            "}}\n\n",
            "All eight keys are required. The only permitted business_severity values are\n",
            "LOW, MEDIUM, HIGH, and CRITICAL.\n\n",
            "REASONING RULES:\n",
            "- Base predictions on the ACTUAL configuration provided, not generic best practices.\n",
            "- Use historical incident data to estimate recovery times; prioritize specific\n",
            "  observed times over general ranges, and never estimate below observed history.\n",
            "- Compare the predicted recovery time and data loss against the RTO/RPO policies.\n",
            "- Explain your reasoning clearly in the \"why\" array.\n\n",
            "CONFIDENCE GUIDELINES:\n",
            "- High (0.8-1.0): direct historical data for this exact scenario.\n",
            "- Medium (0.6-0.79): extrapolated from similar scenarios.\n",
            "- Low (below 0.6): critical data is missing.\n\n",
            "Return ONLY the JSON object. No markdown, no commentary, no text outside it.\n",
        ),
        identifier = context.snapshot.identifier,
        scenario_name = descriptor.name,
        scenario_section = descriptor.prompt_section,
        snapshot = format_snapshot(&context.snapshot),
        policy = context.policy.text,
    )
}

/// Corrective instruction for the single bounded repair attempt: the
/// original instruction plus the validator's field-level failure message.
pub fn render_repair_instruction(original: &str, violation: &str) -> String {
    format!(
        concat!(
            "{original}\n",
            "---\n",
            "CORRECTION REQUIRED:\n",
            "Your previous answer was rejected: {violation}.\n",
            "Respond again with ONLY the JSON object, satisfying the schema above exactly.\n",
        ),
        original = original,
        violation = violation,
    )
}

fn format_snapshot(snapshot: &ConfigurationSnapshot) -> String {
    let max_storage = match snapshot.max_allocated_storage_gb {
        Some(gb) => format!("{gb} GB"),
        None => "not configured".to_string(),
    };
    format!(
        concat!(
            "Database: {identifier}\n",
            "Engine: {engine}\n",
            "Instance Class: {instance_class}\n",
            "Multi-AZ: {multi_az}\n",
            "PITR Enabled: {pitr}\n",
            "Backup Retention: {retention} days\n",
            "Read Replicas: {replicas}\n",
            "Allocated Storage: {storage} GB\n",
            "Max Allocated Storage: {max_storage}\n",
        ),
        identifier = snapshot.identifier,
        engine = snapshot.engine,
        instance_class = snapshot.instance_class,
        multi_az = snapshot.multi_az,
        pitr = snapshot.pitr_enabled,
        retention = snapshot.backup_retention_days,
        replicas = snapshot.read_replicas,
        storage = snapshot.allocated_storage_gb,
        max_storage = max_storage,
    )
}
