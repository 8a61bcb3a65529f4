use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        orders::{AssignStaffRequest, CreateOrderRequest, OrderItemInput, OrderList, StaffList, UpdateStatusRequest},
        users::{UpdateRoleRequest, UserList},
    },
    models::{
        DeliveryAddress, OrderItemView, OrderStatus, OrderView, PaymentMethod, RestaurantSummary,
        Role, UserAccount, UserSummary,
    },
    response::{ApiResponse, Meta},
    routes::{admin, health, orders, params, staff},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        orders::create_order,
        orders::list_my_orders,
        orders::get_order,
        orders::cancel_order,
        staff::list_assigned_orders,
        staff::get_order_details,
        staff::update_order_status,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::assign_order,
        admin::list_staff,
        admin::list_users,
        admin::update_user_role,
        admin::toggle_user_status
    ),
    components(
        schemas(
            Role,
            OrderStatus,
            PaymentMethod,
            DeliveryAddress,
            UserSummary,
            RestaurantSummary,
            OrderItemView,
            OrderView,
            OrderItemInput,
            CreateOrderRequest,
            AssignStaffRequest,
            UpdateStatusRequest,
            OrderList,
            StaffList,
            UserAccount,
            UserList,
            UpdateRoleRequest,
            params::Pagination,
            params::SortOrder,
            Meta,
            ApiResponse<OrderView>,
            ApiResponse<OrderList>,
            ApiResponse<StaffList>,
            ApiResponse<UserAccount>,
            ApiResponse<UserList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Orders", description = "Customer order endpoints"),
        (name = "Staff", description = "Endpoints for staff handling assigned orders"),
        (name = "Admin", description = "Order and user administration endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
