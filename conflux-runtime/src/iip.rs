//! IIP Injector (spec §4.7): after the network settle period, deliver
//! each planned IIP as a single data IP over a transient PUSH connection.

use conflux_ip::Ip;
use conflux_planner::Plan;
use tokio::time::{sleep, Duration};

/// Settle period before injection begins (spec §4.6 "Readiness").
pub const SETTLE_PERIOD: Duration = Duration::from_secs(2);

pub fn inject_all(context: &zmq::Context, plan: &Plan) {
    for iip in &plan.iips {
        if let Err(e) = inject_one(context, &iip.address, &iip.data) {
            // Non-fatal (spec §7 "IIP-send failure").
            tracing::warn!(address = %iip.address, error = %e, "IIP send failed");
        }
    }
}

fn inject_one(context: &zmq::Context, address: &str, data: &str) -> Result<(), zmq::Error> {
    let socket = context.socket(zmq::PUSH)?;
    socket.connect(address)?;
    let ip = Ip::new_packet(data.as_bytes().to_vec());
    let [tag, payload] = ip.to_frames();
    socket.send_multipart([tag, payload], 0)?;
    Ok(())
}

pub async fn settle() {
    sleep(SETTLE_PERIOD).await;
}
