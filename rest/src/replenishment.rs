use std::sync::Arc;

use axum::body::Body;
use axum::extract::Path;
use axum::routing::{get, post, put};
use axum::{extract::State, response::Response};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use service::replenishment::{
    IntervalUnit, OrderLine, OrderTemplate, Replenishment, ReplenishmentPayment,
    ReplenishmentRequest, ReplenishmentService, ReplenishmentStatus, ReplenishmentUpdate,
};
use uuid::Uuid;

use crate::{error_handler, RestStateDef};

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalUnitTO {
    Day,
    Week,
    Month,
    Year,
    Custom,
}
impl From<IntervalUnit> for IntervalUnitTO {
    fn from(unit: IntervalUnit) -> Self {
        match unit {
            IntervalUnit::Day => Self::Day,
            IntervalUnit::Week => Self::Week,
            IntervalUnit::Month => Self::Month,
            IntervalUnit::Year => Self::Year,
            IntervalUnit::Custom => Self::Custom,
        }
    }
}
impl From<IntervalUnitTO> for IntervalUnit {
    fn from(unit: IntervalUnitTO) -> Self {
        match unit {
            IntervalUnitTO::Day => Self::Day,
            IntervalUnitTO::Week => Self::Week,
            IntervalUnitTO::Month => Self::Month,
            IntervalUnitTO::Year => Self::Year,
            IntervalUnitTO::Custom => Self::Custom,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplenishmentStatusTO {
    Scheduled,
    Active,
    Canceled,
    Finished,
}
impl From<ReplenishmentStatus> for ReplenishmentStatusTO {
    fn from(status: ReplenishmentStatus) -> Self {
        match status {
            ReplenishmentStatus::Scheduled => Self::Scheduled,
            ReplenishmentStatus::Active => Self::Active,
            ReplenishmentStatus::Canceled => Self::Canceled,
            ReplenishmentStatus::Finished => Self::Finished,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct OrderLineTO {
    pub product_id: Uuid,
    pub quantity: u32,
    pub unit_price_cents: u32,
}
impl From<&OrderLine> for OrderLineTO {
    fn from(line: &OrderLine) -> Self {
        Self {
            product_id: line.product_id,
            quantity: line.quantity,
            unit_price_cents: line.unit_price_cents,
        }
    }
}
impl From<&OrderLineTO> for OrderLine {
    fn from(line: &OrderLineTO) -> Self {
        Self {
            product_id: line.product_id,
            quantity: line.quantity,
            unit_price_cents: line.unit_price_cents,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct OrderTemplateTO {
    pub lines: Vec<OrderLineTO>,
    pub payment_method: Arc<str>,
    pub shipping_country: Arc<str>,
}
impl From<&OrderTemplate> for OrderTemplateTO {
    fn from(template: &OrderTemplate) -> Self {
        Self {
            lines: template.lines.iter().map(OrderLineTO::from).collect(),
            payment_method: template.payment_method.clone(),
            shipping_country: template.shipping_country.clone(),
        }
    }
}
impl From<&OrderTemplateTO> for OrderTemplate {
    fn from(template: &OrderTemplateTO) -> Self {
        Self {
            lines: template.lines.iter().map(OrderLine::from).collect(),
            payment_method: template.payment_method.clone(),
            shipping_country: template.shipping_country.clone(),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct ReplenishmentTO {
    #[serde(default)]
    pub id: Uuid,
    pub customer_id: Uuid,
    pub scheduler_id: Arc<str>,
    #[serde(default)]
    pub next_job_id: Option<Arc<str>>,
    pub template: OrderTemplateTO,
    pub interval: u32,
    pub unit: IntervalUnitTO,
    pub start_date: time::PrimitiveDateTime,
    #[serde(default)]
    pub end_date: Option<time::PrimitiveDateTime>,
    #[serde(default)]
    pub times: Option<u32>,
    pub executions: u32,
    #[serde(default)]
    pub last_payment_date: Option<time::PrimitiveDateTime>,
    #[serde(default)]
    pub next_payment_date: Option<time::PrimitiveDateTime>,
    pub status: ReplenishmentStatusTO,
    pub created: time::PrimitiveDateTime,
    #[serde(rename = "$version")]
    #[serde(default)]
    pub version: Uuid,
}
impl From<&Replenishment> for ReplenishmentTO {
    fn from(replenishment: &Replenishment) -> Self {
        Self {
            id: replenishment.id,
            customer_id: replenishment.customer_id,
            scheduler_id: replenishment.scheduler_id.clone(),
            next_job_id: replenishment.next_job_id.clone(),
            template: OrderTemplateTO::from(&replenishment.template),
            interval: replenishment.interval,
            unit: replenishment.unit.into(),
            start_date: replenishment.start_date,
            end_date: replenishment.end_date,
            times: replenishment.times,
            executions: replenishment.executions,
            last_payment_date: replenishment.last_payment_date,
            next_payment_date: replenishment.next_payment_date,
            status: replenishment.status.into(),
            created: replenishment.created,
            version: replenishment.version,
        }
    }
}
restock_utils::derive_from_reference!(Replenishment, ReplenishmentTO);

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct ReplenishmentPaymentTO {
    pub id: Uuid,
    pub replenishment_id: Uuid,
    pub amount_cents: u64,
    pub executed_at: time::PrimitiveDateTime,
    pub succeeded: bool,
}
impl From<&ReplenishmentPayment> for ReplenishmentPaymentTO {
    fn from(payment: &ReplenishmentPayment) -> Self {
        Self {
            id: payment.id,
            replenishment_id: payment.replenishment_id,
            amount_cents: payment.amount_cents,
            executed_at: payment.executed_at,
            succeeded: payment.succeeded,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct CreateReplenishmentTO {
    pub customer_id: Uuid,
    pub template: OrderTemplateTO,
    pub interval: u32,
    pub unit: IntervalUnitTO,
    #[serde(default)]
    pub trial_start: Option<time::PrimitiveDateTime>,
    #[serde(default)]
    pub expiry: Option<time::PrimitiveDateTime>,
    #[serde(default)]
    pub times: Option<u32>,
}
impl From<&CreateReplenishmentTO> for ReplenishmentRequest {
    fn from(request: &CreateReplenishmentTO) -> Self {
        Self {
            customer_id: request.customer_id,
            template: OrderTemplate::from(&request.template),
            interval: request.interval,
            unit: request.unit.into(),
            trial_start: request.trial_start,
            expiry: request.expiry,
            times: request.times,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct UpdateReplenishmentTO {
    pub template: OrderTemplateTO,
    pub interval: u32,
    pub unit: IntervalUnitTO,
    #[serde(default)]
    pub new_start_date: Option<time::PrimitiveDateTime>,
}
impl From<&UpdateReplenishmentTO> for ReplenishmentUpdate {
    fn from(update: &UpdateReplenishmentTO) -> Self {
        Self {
            template: OrderTemplate::from(&update.template),
            interval: update.interval,
            unit: update.unit.into(),
            new_start_date: update.new_start_date,
        }
    }
}

pub fn generate_route<RestState: RestStateDef>() -> Router<RestState> {
    Router::new()
        .route("/", post(create_replenishment::<RestState>))
        .route("/{id}", get(get_replenishment::<RestState>))
        .route("/{id}/payments", get(get_payments::<RestState>))
        .route(
            "/customer/{customer_id}",
            get(get_for_customer::<RestState>),
        )
        .route(
            "/{customer_id}/{id}",
            put(update_replenishment::<RestState>)
                .delete(remove_replenishment::<RestState>),
        )
        .route(
            "/{customer_id}/{id}/toggle-cancel",
            post(toggle_cancel_status::<RestState>),
        )
}

pub async fn create_replenishment<RestState: RestStateDef>(
    rest_state: State<RestState>,
    Json(request): Json<CreateReplenishmentTO>,
) -> Response {
    error_handler(
        (async {
            let replenishment: ReplenishmentTO = rest_state
                .replenishment_service()
                .create_replenishment(&(&request).into(), ().into(), None)
                .await?
                .into();
            Ok(Response::builder()
                .status(200)
                .body(Body::new(serde_json::to_string(&replenishment).unwrap()))
                .unwrap())
        })
        .await,
    )
}

pub async fn get_replenishment<RestState: RestStateDef>(
    rest_state: State<RestState>,
    Path(replenishment_id): Path<Uuid>,
) -> Response {
    error_handler(
        (async {
            let replenishment = ReplenishmentTO::from(
                &rest_state
                    .replenishment_service()
                    .get_replenishment(replenishment_id, ().into(), None)
                    .await?,
            );
            Ok(Response::builder()
                .status(200)
                .body(Body::new(serde_json::to_string(&replenishment).unwrap()))
                .unwrap())
        })
        .await,
    )
}

pub async fn get_for_customer<RestState: RestStateDef>(
    rest_state: State<RestState>,
    Path(customer_id): Path<Uuid>,
) -> Response {
    error_handler(
        (async {
            let replenishments: Arc<[ReplenishmentTO]> = rest_state
                .replenishment_service()
                .get_for_customer(customer_id, ().into(), None)
                .await?
                .iter()
                .map(ReplenishmentTO::from)
                .collect();
            Ok(Response::builder()
                .status(200)
                .body(Body::new(serde_json::to_string(&replenishments).unwrap()))
                .unwrap())
        })
        .await,
    )
}

pub async fn get_payments<RestState: RestStateDef>(
    rest_state: State<RestState>,
    Path(replenishment_id): Path<Uuid>,
) -> Response {
    error_handler(
        (async {
            let payments: Arc<[ReplenishmentPaymentTO]> = rest_state
                .replenishment_service()
                .get_payments(replenishment_id, ().into(), None)
                .await?
                .iter()
                .map(ReplenishmentPaymentTO::from)
                .collect();
            Ok(Response::builder()
                .status(200)
                .body(Body::new(serde_json::to_string(&payments).unwrap()))
                .unwrap())
        })
        .await,
    )
}

pub async fn update_replenishment<RestState: RestStateDef>(
    rest_state: State<RestState>,
    Path((customer_id, replenishment_id)): Path<(Uuid, Uuid)>,
    Json(update): Json<UpdateReplenishmentTO>,
) -> Response {
    error_handler(
        (async {
            let replenishment: ReplenishmentTO = rest_state
                .replenishment_service()
                .update_replenishment(
                    customer_id,
                    replenishment_id,
                    &(&update).into(),
                    ().into(),
                    None,
                )
                .await?
                .into();
            Ok(Response::builder()
                .status(200)
                .body(Body::new(serde_json::to_string(&replenishment).unwrap()))
                .unwrap())
        })
        .await,
    )
}

pub async fn toggle_cancel_status<RestState: RestStateDef>(
    rest_state: State<RestState>,
    Path((customer_id, replenishment_id)): Path<(Uuid, Uuid)>,
) -> Response {
    error_handler(
        (async {
            let replenishment: ReplenishmentTO = rest_state
                .replenishment_service()
                .toggle_cancel_status(customer_id, replenishment_id, ().into(), None)
                .await?
                .into();
            Ok(Response::builder()
                .status(200)
                .body(Body::new(serde_json::to_string(&replenishment).unwrap()))
                .unwrap())
        })
        .await,
    )
}

pub async fn remove_replenishment<RestState: RestStateDef>(
    rest_state: State<RestState>,
    Path((customer_id, replenishment_id)): Path<(Uuid, Uuid)>,
) -> Response {
    error_handler(
        (async {
            rest_state
                .replenishment_service()
                .remove_replenishment(customer_id, replenishment_id, ().into(), None)
                .await?;
            Ok(Response::builder()
                .status(204)
                .body(Body::empty())
                .unwrap())
        })
        .await,
    )
}
