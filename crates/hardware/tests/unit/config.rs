//! # Configuration Tests
//!
//! Tunables and topology descriptions loaded from JSON strings and files.

use std::io::Write;
use std::time::Duration;

use powerdbg_core::chip::Generation;
use powerdbg_core::config::{PropertyValue, StatusConfig};
use powerdbg_core::{Config, TopologyConfig};
use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;

#[test]
fn test_defaults_apply_to_empty_document() {
    let config = Config::from_json_str("{}").unwrap();
    assert_eq!(config.general.generation, Generation::P9Nimbus);
    assert_eq!(config.sbefifo.read_timeout(), Duration::from_secs(10));
    assert_eq!(config.sbefifo.long_timeout(), Duration::from_secs(30));
    assert_eq!(config.sbefifo.max_ffdc_bytes, 0x2000);
    assert_eq!(config.pib.indirect_retries, 10);
    assert_eq!(config.pib.wait_retries, 100);
    assert_eq!(config.mem.adu_retries, 10);
}

#[test]
fn test_partial_sections_keep_other_defaults() {
    let config = Config::from_json_str(r#"{ "sbefifo": { "long_timeout_secs": 5 } }"#).unwrap();
    assert_eq!(config.sbefifo.long_timeout_secs, 5);
    assert_eq!(config.sbefifo.max_reply_bytes, 0x10_0000);
}

#[test]
fn test_malformed_config_is_a_config_error() {
    let err = Config::from_json_str(r#"{ "general": { "generation": "P7" } }"#).unwrap_err();
    assert!(err.to_string().starts_with("configuration error"));
}

#[test]
fn test_config_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(br#"{ "general": { "generation": "P9Cumulus" } }"#).unwrap();
    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.general.generation, Generation::P9Cumulus);
}

#[test]
fn test_missing_file_is_a_config_error() {
    assert!(Config::from_file("/nonexistent/powerdbg.json").is_err());
}

#[test]
fn test_topology_property_values() {
    let desc = TopologyConfig::from_json_str(
        r#"{
            "backend": {
                "children": [{
                    "name": "pib@0",
                    "compatible": "ibm,kernel-scom",
                    "status": "must-exist",
                    "properties": {
                        "device": "/dev/scom1",
                        "reg": [0, 4096, 1024],
                        "index": 1,
                        "blob": { "bytes": [1, 2, 3] }
                    }
                }]
            }
        }"#,
    )
    .unwrap();

    let pib = &desc.backend.children[0];
    assert_eq!(pib.status, Some(StatusConfig::MustExist));
    assert_eq!(pib.properties["device"].to_bytes(), b"/dev/scom1\0");
    assert_eq!(pib.properties["reg"], PropertyValue::Cells(vec![0, 4096, 1024]));
    assert_eq!(pib.properties["index"].to_bytes(), [0, 0, 0, 1]);
    assert_eq!(pib.properties["blob"].to_bytes(), [1, 2, 3]);
    assert!(desc.system.children.is_empty());
}

#[test]
fn test_unknown_node_fields_are_rejected() {
    let result = TopologyConfig::from_json_str(
        r#"{ "backend": { "children": [{ "name": "pib", "compatibel": "x" }] } }"#,
    );
    assert!(result.is_err());
}
