use homelab_log::{fields, root, scope, with_span, ErrorReport, Fields, LogError};

fn sync_node(node: &str) -> Result<(), LogError> {
    // picks up whatever logger the caller scoped
    homelab_log::current().info("syncing node", fields!("node": node))
}

fn main() -> Result<(), LogError> {
    let logger = root();
    logger.info("starting backup run", fields!("dry_run": false))?;

    let backup = logger.with_category("backup").with_request("req-001", None);
    backup.debug("resolving targets", Fields::new())?;
    backup.log_request("POST", "/api/backups", Some("req-001"), Some("homelab-cli/1.0"), Fields::new())?;

    scope(&backup, || sync_node("pve-1"))?;
    with_span("trace-0a1b2c3d4e", Some("span-01"), || sync_node("pve-2"))?;

    let err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "cannot open /var/backups");
    backup.log_error(&ErrorReport::from_io_error(&err), fields!("path": "/var/backups"))?;

    backup.log_response("POST", "/api/backups", 500, 1240, Some("req-001"), Fields::new())
}
