use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{error, info, info_span, Instrument};

use crate::database::TenantConfig;
use crate::error::Result;
use crate::firing::service::{FiringService, TenantReport};
use crate::gitlab::GatewayFactory;
use crate::notifier::NotificationSink;
use crate::schedule::ScheduledJob;

/// Source of tenant configurations, read fresh at the start of each tick.
#[async_trait]
pub trait TenantSource: Send + Sync {
    async fn list_tenants(&self) -> Result<Vec<TenantConfig>>;
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub tenants: Vec<(i64, TenantReport)>,
    /// Tenants whose gateway could not be built.
    pub skipped_tenants: Vec<i64>,
}

/// The scheduled body: fans one tick out over every tenant, one after the
/// other. A failing tenant never stops the others.
pub struct FiringJob {
    tenants: Arc<dyn TenantSource>,
    gateways: Arc<dyn GatewayFactory>,
    sink: Arc<dyn NotificationSink>,
    service: FiringService,
}

impl FiringJob {
    pub fn new(
        tenants: Arc<dyn TenantSource>,
        gateways: Arc<dyn GatewayFactory>,
        sink: Arc<dyn NotificationSink>,
        service: FiringService,
    ) -> Self {
        Self {
            tenants,
            gateways,
            sink,
            service,
        }
    }

    pub async fn run_once(&self, now: DateTime<Utc>) -> TickReport {
        let mut tick = TickReport::default();

        let tenants = match self.tenants.list_tenants().await {
            Ok(tenants) => tenants,
            Err(e) => {
                error!("Failed to get clients from repository: {}", e);
                return tick;
            }
        };

        for tenant in tenants {
            let span = info_span!("tenant", id = tenant.id, group_id = tenant.group_id);

            let gateway = match self.gateways.make_gateway(&tenant.gitlab_token) {
                Ok(gateway) => gateway,
                Err(e) => {
                    span.in_scope(|| error!("Failed to make GitLab client: {}", e));
                    tick.skipped_tenants.push(tenant.id);
                    continue;
                }
            };

            let report = async {
                info!("Start processing client {}", tenant.id);
                let report = self
                    .service
                    .process_tenant(&tenant, gateway.as_ref(), self.sink.as_ref(), now)
                    .await;
                info!(
                    "Finish processing client {}: {} firing, {} delivery failures",
                    tenant.id,
                    report.total(),
                    report.delivery_failures
                );
                report
            }
            .instrument(span)
            .await;

            tick.tenants.push((tenant.id, report));
        }

        tick
    }
}

#[async_trait]
impl ScheduledJob for FiringJob {
    fn name(&self) -> &str {
        "firing job"
    }

    async fn run(&self) {
        info!("Starting firing job");
        let tick = self.run_once(Utc::now()).await;
        info!(
            "Ending firing job: {} clients processed, {} skipped",
            tick.tenants.len(),
            tick.skipped_tenants.len()
        );
    }
}
