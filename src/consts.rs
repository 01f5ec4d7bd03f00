//! Fixed index names, source locations and key paths

/// Segment delimiter for config key paths
pub const KEY_DELIM: char = '>';

// =============================================================================
// Config Indices
// =============================================================================

/// Index of the global HA configuration
pub const HA_GLOBAL_INDEX: &str = "ha_conf";

/// Index of the cluster controller interface schema
pub const CM_CONTROLLER_INDEX: &str = "cluster_controller";

/// Index of the alert filter rules
pub const ALERT_FILTER_INDEX: &str = "alert_filter_rules";

/// Index of the alert event rules
pub const ALERT_EVENT_INDEX: &str = "alert_event_rules";

// =============================================================================
// Source Locations
// =============================================================================

pub const HA_CONFIG_FILE: &str = "/etc/ha/ha.conf";
pub const CM_CONTROLLER_SCHEMA: &str = "/etc/ha/cluster_controller_schema.json";
pub const ALERT_FILTER_RULES_FILE: &str = "/etc/ha/alert_filter_rules.json";
pub const ALERT_EVENT_RULES_FILE: &str = "/etc/ha/alert_event_rules.json";

// =============================================================================
// Global Config Keys
// =============================================================================

pub const LOG_PATH_KEY: &str = "LOG>path";
pub const LOG_LEVEL_KEY: &str = "LOG>level";
pub const VERSION_KEY: &str = "VERSION>version";
pub const LOCAL_NODE_KEY: &str = "CLUSTER_MANAGER>local_node";
pub const HW_ENV_KEY: &str = "CLUSTER_MANAGER>env";
pub const CONSUL_ENDPOINT_KEY: &str = "consul_config>endpoint";

// =============================================================================
// KV Namespace
// =============================================================================

/// Prefix all cluster configuration keys live under
pub const CLUSTER_CONFSTORE_PREFIX: &str = "ha/v1/";

/// Key holding the private FQDN to node id mapping
pub const PVTFQDN_TO_NODEID_KEY: &str = "pvtfqdn_to_nodeid";
