use utoipa::OpenApi;

use crate::api;

#[derive(OpenApi)]
#[openapi(
    servers(
        (url = "/api/v1", description = "Escrow API server")
    ),
    paths(
        api::handlers::users::create_user,
        api::handlers::users::get_user,
        api::handlers::escrow::create_reservation,
        api::handlers::escrow::commit_reservation,
        api::handlers::escrow::refund_reservation,
        api::handlers::escrow::get_reservation,
        api::handlers::escrow::sweep_reservations,
    ),
    components(
        schemas(
            api::models::users::UserCreate,
            api::models::users::UserResponse,
            api::models::escrow::ReservationCreate,
            api::models::escrow::ReservationResponse,
            api::models::escrow::RefundRequest,
            api::models::escrow::SweepResponse,
            crate::db::models::escrow::TransactionStatus,
            crate::db::models::escrow::ItemType,
        )
    ),
    tags(
        (name = "users", description = "User accounts and credit balances"),
        (name = "reservations", description = "Credit escrow: reserve, commit, refund"),
        (name = "maintenance", description = "Out-of-band maintenance, invoked by an external scheduler"),
    ),
    info(
        title = "escrowd API",
        version = "0.3.0",
        description = "Transactional credit escrow guarding paid AI-generation operations",
    ),
)]
pub struct ApiDoc;
