use homelab_log::init::install_bridge;
use homelab_log::root;

fn main() {
    install_bridge(root().with_category("cluster")).expect("no other global subscriber");

    tracing::info!(node = "pve-1", "node online");
    tracing::warn!(node = "pve-2", duration_ms = 850u64, "slow heartbeat");
    tracing::error!(request_id = "req-77", "quorum lost");
}
