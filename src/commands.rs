pub mod get_vulnerabilities;
