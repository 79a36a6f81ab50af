use std::sync::Arc;

use axum::body::Body;
use axum::extract::Path;
use axum::routing::{get, post};
use axum::{extract::State, response::Response};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use service::customer::{Customer, CustomerService};
use uuid::Uuid;

use crate::{error_handler, RestStateDef};

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CustomerTO {
    #[serde(default)]
    pub id: Uuid,
    pub name: Arc<str>,
    pub email: Arc<str>,
    pub country: Arc<str>,
    #[serde(default)]
    pub deleted: Option<time::PrimitiveDateTime>,
    #[serde(rename = "$version")]
    #[serde(default)]
    pub version: Uuid,
}
impl From<&Customer> for CustomerTO {
    fn from(customer: &Customer) -> Self {
        Self {
            id: customer.id,
            name: customer.name.clone(),
            email: customer.email.clone(),
            country: customer.country.clone(),
            deleted: customer.deleted,
            version: customer.version,
        }
    }
}
impl From<&CustomerTO> for Customer {
    fn from(customer: &CustomerTO) -> Self {
        Self {
            id: customer.id,
            name: customer.name.clone(),
            email: customer.email.clone(),
            country: customer.country.clone(),
            deleted: customer.deleted,
            version: customer.version,
        }
    }
}
restock_utils::derive_from_reference!(Customer, CustomerTO);

pub fn generate_route<RestState: RestStateDef>() -> Router<RestState> {
    Router::new()
        .route("/", get(get_all_customers::<RestState>))
        .route("/{id}", get(get_customer::<RestState>))
        .route("/", post(create_customer::<RestState>))
}

pub async fn get_all_customers<RestState: RestStateDef>(rest_state: State<RestState>) -> Response {
    error_handler(
        (async {
            let customers: Arc<[CustomerTO]> = rest_state
                .customer_service()
                .get_all(().into(), None)
                .await?
                .iter()
                .map(CustomerTO::from)
                .collect();
            Ok(Response::builder()
                .status(200)
                .body(Body::new(serde_json::to_string(&customers).unwrap()))
                .unwrap())
        })
        .await,
    )
}

pub async fn get_customer<RestState: RestStateDef>(
    rest_state: State<RestState>,
    Path(customer_id): Path<Uuid>,
) -> Response {
    error_handler(
        (async {
            let customer = CustomerTO::from(
                &rest_state
                    .customer_service()
                    .get(customer_id, ().into(), None)
                    .await?,
            );
            Ok(Response::builder()
                .status(200)
                .body(Body::new(serde_json::to_string(&customer).unwrap()))
                .unwrap())
        })
        .await,
    )
}

pub async fn create_customer<RestState: RestStateDef>(
    rest_state: State<RestState>,
    Json(customer): Json<CustomerTO>,
) -> Response {
    error_handler(
        (async {
            let customer: CustomerTO = rest_state
                .customer_service()
                .create(&(&customer).into(), ().into(), None)
                .await?
                .into();
            Ok(Response::builder()
                .status(200)
                .body(Body::new(serde_json::to_string(&customer).unwrap()))
                .unwrap())
        })
        .await,
    )
}
