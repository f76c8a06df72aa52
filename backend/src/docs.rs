#![allow(dead_code)] // OpenAPI doc stubs are only referenced by utoipa macros.

use crate::error::ErrorResponse;
use crate::models::{
    activity_log::{ActivityLog, ActivityLogQuery},
    cart::{AddCartItemRequest, CartItem, CartResponse, UpdateCartItemRequest},
    homepage::{Homepage, HomepagePayload},
    product::{Product, ProductPayload, ProductSize, ProductSizePayload},
    support_ticket::{
        Chat, ChatQuery, CreateTicketRequest, PostChatRequest, SupportTicket, TicketStatus,
        UpdateTicketRequest,
    },
    transaction::{TransactionItem, TransactionResponse, TransactionState, UpdateTransactionRequest},
    user::{
        AuthResponse, ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, RegisterRequest,
        ResetPasswordRequest, SearchQuery, UpdateUserRequest, UserResponse, UserRole,
    },
    voucher::{RedemptionResponse, UserVoucher, Voucher, VoucherKind, VoucherPayload, VoucherStatus},
    wishlist::{Wishlist, WishlistPayload, WishlistProductRequest},
};
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};

#[derive(OpenApi)]
#[openapi(
    info(title = "Bliss API", description = "Skincare storefront backend"),
    paths(
        register_doc,
        login_doc,
        me_doc,
        list_users_doc,
        get_user_doc,
        update_user_doc,
        delete_user_doc,
        change_password_doc,
        forgot_password_doc,
        reset_password_doc,
        list_products_doc,
        get_product_doc,
        create_product_doc,
        update_product_doc,
        delete_product_doc,
        list_wishlists_doc,
        get_wishlist_doc,
        create_wishlist_doc,
        update_wishlist_doc,
        delete_wishlist_doc,
        add_wishlist_product_doc,
        remove_wishlist_product_doc,
        list_homepages_doc,
        get_homepage_doc,
        create_homepage_doc,
        update_homepage_doc,
        delete_homepage_doc,
        list_vouchers_doc,
        get_voucher_doc,
        create_voucher_doc,
        update_voucher_doc,
        delete_voucher_doc,
        redeem_voucher_doc,
        list_user_vouchers_doc,
        get_user_voucher_doc,
        use_user_voucher_doc,
        get_cart_doc,
        add_cart_item_doc,
        update_cart_item_doc,
        remove_cart_item_doc,
        init_transaction_doc,
        update_transaction_doc,
        finalize_transaction_doc,
        current_transaction_doc,
        transaction_history_doc,
        list_tickets_doc,
        get_ticket_doc,
        create_ticket_doc,
        update_ticket_doc,
        delete_ticket_doc,
        list_chats_doc,
        post_chat_doc,
        admin_activity_logs_doc
    ),
    components(
        schemas(
            ErrorResponse,
            // users
            RegisterRequest,
            LoginRequest,
            AuthResponse,
            UserResponse,
            UserRole,
            UpdateUserRequest,
            ChangePasswordRequest,
            ForgotPasswordRequest,
            ResetPasswordRequest,
            // catalogue
            Product,
            ProductSize,
            ProductPayload,
            ProductSizePayload,
            Homepage,
            HomepagePayload,
            Wishlist,
            WishlistPayload,
            WishlistProductRequest,
            // rewards
            Voucher,
            VoucherKind,
            VoucherStatus,
            VoucherPayload,
            UserVoucher,
            RedemptionResponse,
            // checkout
            CartResponse,
            CartItem,
            AddCartItemRequest,
            UpdateCartItemRequest,
            TransactionResponse,
            TransactionItem,
            TransactionState,
            UpdateTransactionRequest,
            // support
            SupportTicket,
            TicketStatus,
            CreateTicketRequest,
            UpdateTicketRequest,
            Chat,
            PostChatRequest,
            // admin
            ActivityLog
        )
    ),
    modifiers(&SecuritySchemes),
    tags(
        (name = "User", description = "Accounts, authentication and passwords"),
        (name = "Product", description = "Product catalogue"),
        (name = "Wishlist", description = "Saved product lists"),
        (name = "Homepage", description = "Curated homepage sections"),
        (name = "Voucher", description = "Reward vouchers and claims"),
        (name = "Cart", description = "Shopping cart"),
        (name = "Transaction", description = "Checkout lifecycle"),
        (name = "Support", description = "Support tickets and chat"),
        (name = "Admin", description = "Administrator API")
    ),
    security(("BearerAuth" = []))
)]
pub struct ApiDoc;

struct SecuritySchemes;

impl Modify for SecuritySchemes {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();

        let mut bearer = Http::new(HttpAuthScheme::Bearer);
        bearer.bearer_format = Some("JWT".to_string());

        components.add_security_scheme("BearerAuth", SecurityScheme::Http(bearer));
    }
}

// ---- users ----

#[utoipa::path(
    post,
    path = "/User/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 409, description = "Username or email already taken")
    ),
    tag = "User",
    security(())
)]
fn register_doc() {}

#[utoipa::path(
    post,
    path = "/User/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 401, description = "Invalid credentials, locked account, or missing 2FA code")
    ),
    tag = "User",
    security(())
)]
fn login_doc() {}

#[utoipa::path(
    get,
    path = "/User/me",
    responses((status = 200, description = "Signed-in user", body = UserResponse)),
    tag = "User"
)]
fn me_doc() {}

#[utoipa::path(
    get,
    path = "/User",
    params(SearchQuery),
    responses(
        (status = 200, body = [UserResponse]),
        (status = 403, description = "Staff only")
    ),
    tag = "User"
)]
fn list_users_doc() {}

#[utoipa::path(
    get,
    path = "/User/{id}",
    params(("id" = i64, Path, description = "User id")),
    responses((status = 200, body = UserResponse), (status = 404)),
    tag = "User"
)]
fn get_user_doc() {}

#[utoipa::path(
    put,
    path = "/User/{id}",
    params(("id" = i64, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses((status = 200, body = UserResponse), (status = 403)),
    tag = "User"
)]
fn update_user_doc() {}

#[utoipa::path(
    delete,
    path = "/User/{id}",
    params(("id" = i64, Path, description = "User id")),
    responses((status = 204), (status = 403)),
    tag = "User"
)]
fn delete_user_doc() {}

#[utoipa::path(
    post,
    path = "/User/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, body = serde_json::Value),
        (status = 400, description = "Password was used recently")
    ),
    tag = "User"
)]
fn change_password_doc() {}

#[utoipa::path(
    post,
    path = "/User/forgot-password",
    request_body = ForgotPasswordRequest,
    responses((status = 200, body = serde_json::Value)),
    tag = "User",
    security(())
)]
fn forgot_password_doc() {}

#[utoipa::path(
    post,
    path = "/User/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, body = serde_json::Value),
        (status = 400, description = "Invalid or expired token")
    ),
    tag = "User",
    security(())
)]
fn reset_password_doc() {}

// ---- products ----

#[utoipa::path(
    get,
    path = "/Product",
    params(SearchQuery),
    responses((status = 200, body = [Product])),
    tag = "Product",
    security(())
)]
fn list_products_doc() {}

#[utoipa::path(
    get,
    path = "/Product/{id}",
    params(("id" = i64, Path, description = "Product id")),
    responses((status = 200, body = Product), (status = 404)),
    tag = "Product",
    security(())
)]
fn get_product_doc() {}

#[utoipa::path(
    post,
    path = "/Product",
    request_body = ProductPayload,
    responses((status = 201, body = Product), (status = 403)),
    tag = "Product"
)]
fn create_product_doc() {}

#[utoipa::path(
    put,
    path = "/Product/{id}",
    params(("id" = i64, Path, description = "Product id")),
    request_body = ProductPayload,
    responses((status = 200, body = Product), (status = 403), (status = 404)),
    tag = "Product"
)]
fn update_product_doc() {}

#[utoipa::path(
    delete,
    path = "/Product/{id}",
    params(("id" = i64, Path, description = "Product id")),
    responses((status = 204), (status = 403), (status = 404)),
    tag = "Product"
)]
fn delete_product_doc() {}

// ---- wishlists ----

#[utoipa::path(
    get,
    path = "/Wishlist",
    params(SearchQuery),
    responses((status = 200, body = [Wishlist])),
    tag = "Wishlist"
)]
fn list_wishlists_doc() {}

#[utoipa::path(
    get,
    path = "/Wishlist/{id}",
    params(("id" = i64, Path, description = "Wishlist id")),
    responses((status = 200, body = Wishlist), (status = 403), (status = 404)),
    tag = "Wishlist"
)]
fn get_wishlist_doc() {}

#[utoipa::path(
    post,
    path = "/Wishlist",
    request_body = WishlistPayload,
    responses((status = 201, body = Wishlist)),
    tag = "Wishlist"
)]
fn create_wishlist_doc() {}

#[utoipa::path(
    put,
    path = "/Wishlist/{id}",
    params(("id" = i64, Path, description = "Wishlist id")),
    request_body = WishlistPayload,
    responses((status = 200, body = Wishlist), (status = 403), (status = 404)),
    tag = "Wishlist"
)]
fn update_wishlist_doc() {}

#[utoipa::path(
    delete,
    path = "/Wishlist/{id}",
    params(("id" = i64, Path, description = "Wishlist id")),
    responses((status = 204), (status = 403), (status = 404)),
    tag = "Wishlist"
)]
fn delete_wishlist_doc() {}

#[utoipa::path(
    post,
    path = "/Wishlist/{id}/products",
    params(("id" = i64, Path, description = "Wishlist id")),
    request_body = WishlistProductRequest,
    responses((status = 200, body = Wishlist), (status = 404)),
    tag = "Wishlist"
)]
fn add_wishlist_product_doc() {}

#[utoipa::path(
    delete,
    path = "/Wishlist/{id}/products/{product_id}",
    params(
        ("id" = i64, Path, description = "Wishlist id"),
        ("product_id" = i64, Path, description = "Product id")
    ),
    responses((status = 200, body = Wishlist), (status = 404)),
    tag = "Wishlist"
)]
fn remove_wishlist_product_doc() {}

// ---- homepages ----

#[utoipa::path(
    get,
    path = "/Homepage",
    params(SearchQuery),
    responses((status = 200, body = [Homepage])),
    tag = "Homepage",
    security(())
)]
fn list_homepages_doc() {}

#[utoipa::path(
    get,
    path = "/Homepage/{id}",
    params(("id" = i64, Path, description = "Homepage id")),
    responses((status = 200, body = Homepage), (status = 404)),
    tag = "Homepage",
    security(())
)]
fn get_homepage_doc() {}

#[utoipa::path(
    post,
    path = "/Homepage",
    request_body = HomepagePayload,
    responses((status = 201, body = Homepage), (status = 403)),
    tag = "Homepage"
)]
fn create_homepage_doc() {}

#[utoipa::path(
    put,
    path = "/Homepage/{id}",
    params(("id" = i64, Path, description = "Homepage id")),
    request_body = HomepagePayload,
    responses((status = 200, body = Homepage), (status = 403), (status = 404)),
    tag = "Homepage"
)]
fn update_homepage_doc() {}

#[utoipa::path(
    delete,
    path = "/Homepage/{id}",
    params(("id" = i64, Path, description = "Homepage id")),
    responses((status = 204), (status = 403), (status = 404)),
    tag = "Homepage"
)]
fn delete_homepage_doc() {}

// ---- vouchers ----

#[utoipa::path(
    get,
    path = "/Voucher",
    params(SearchQuery),
    responses((status = 200, body = [Voucher])),
    tag = "Voucher",
    security(())
)]
fn list_vouchers_doc() {}

#[utoipa::path(
    get,
    path = "/Voucher/{id}",
    params(("id" = i64, Path, description = "Voucher id")),
    responses((status = 200, body = Voucher), (status = 404)),
    tag = "Voucher",
    security(())
)]
fn get_voucher_doc() {}

#[utoipa::path(
    post,
    path = "/Voucher",
    request_body = VoucherPayload,
    responses((status = 201, body = Voucher), (status = 403)),
    tag = "Voucher"
)]
fn create_voucher_doc() {}

#[utoipa::path(
    put,
    path = "/Voucher/{id}",
    params(("id" = i64, Path, description = "Voucher id")),
    request_body = VoucherPayload,
    responses((status = 200, body = Voucher), (status = 403), (status = 404)),
    tag = "Voucher"
)]
fn update_voucher_doc() {}

#[utoipa::path(
    delete,
    path = "/Voucher/{id}",
    params(("id" = i64, Path, description = "Voucher id")),
    responses((status = 204), (status = 403), (status = 404)),
    tag = "Voucher"
)]
fn delete_voucher_doc() {}

#[utoipa::path(
    post,
    path = "/Voucher/{id}/redeem",
    params(("id" = i64, Path, description = "Voucher id")),
    responses(
        (status = 201, description = "Voucher claimed", body = RedemptionResponse),
        (status = 400, description = "Sold out, outside validity window, or insufficient points"),
        (status = 404)
    ),
    tag = "Voucher"
)]
fn redeem_voucher_doc() {}

#[utoipa::path(
    get,
    path = "/UserVoucher",
    responses((status = 200, body = [UserVoucher])),
    tag = "Voucher"
)]
fn list_user_vouchers_doc() {}

#[utoipa::path(
    get,
    path = "/UserVoucher/{id}",
    params(("id" = i64, Path, description = "Claim id")),
    responses((status = 200, body = UserVoucher), (status = 403), (status = 404)),
    tag = "Voucher"
)]
fn get_user_voucher_doc() {}

#[utoipa::path(
    post,
    path = "/UserVoucher/{id}/use",
    params(("id" = i64, Path, description = "Claim id")),
    responses(
        (status = 200, body = UserVoucher),
        (status = 400, description = "Already used or expired")
    ),
    tag = "Voucher"
)]
fn use_user_voucher_doc() {}

// ---- cart ----

#[utoipa::path(
    get,
    path = "/api/Cart",
    responses((status = 200, body = CartResponse)),
    tag = "Cart"
)]
fn get_cart_doc() {}

#[utoipa::path(
    post,
    path = "/api/Cart/items",
    request_body = AddCartItemRequest,
    responses((status = 200, body = CartResponse), (status = 400), (status = 404)),
    tag = "Cart"
)]
fn add_cart_item_doc() {}

#[utoipa::path(
    put,
    path = "/api/Cart/items/{item_id}",
    params(("item_id" = i64, Path, description = "Cart item id")),
    request_body = UpdateCartItemRequest,
    responses((status = 200, body = CartResponse), (status = 404)),
    tag = "Cart"
)]
fn update_cart_item_doc() {}

#[utoipa::path(
    delete,
    path = "/api/Cart/items/{item_id}",
    params(("item_id" = i64, Path, description = "Cart item id")),
    responses((status = 200, body = CartResponse), (status = 404)),
    tag = "Cart"
)]
fn remove_cart_item_doc() {}

// ---- transactions ----

#[utoipa::path(
    post,
    path = "/api/Transaction/init",
    responses(
        (status = 201, body = TransactionResponse),
        (status = 400, description = "Cart is empty")
    ),
    tag = "Transaction"
)]
fn init_transaction_doc() {}

#[utoipa::path(
    put,
    path = "/api/Transaction",
    request_body = UpdateTransactionRequest,
    responses(
        (status = 200, body = TransactionResponse),
        (status = 404, description = "No open transaction")
    ),
    tag = "Transaction"
)]
fn update_transaction_doc() {}

#[utoipa::path(
    post,
    path = "/api/Transaction/finalize",
    responses(
        (status = 200, body = TransactionResponse),
        (status = 404, description = "No open transaction")
    ),
    tag = "Transaction"
)]
fn finalize_transaction_doc() {}

#[utoipa::path(
    get,
    path = "/api/Transaction/current",
    responses((status = 200, body = TransactionResponse), (status = 404)),
    tag = "Transaction"
)]
fn current_transaction_doc() {}

#[utoipa::path(
    get,
    path = "/api/Transaction",
    responses((status = 200, body = [TransactionResponse])),
    tag = "Transaction"
)]
fn transaction_history_doc() {}

// ---- support ----

#[utoipa::path(
    get,
    path = "/SupportTicket",
    params(SearchQuery),
    responses((status = 200, body = [SupportTicket])),
    tag = "Support"
)]
fn list_tickets_doc() {}

#[utoipa::path(
    get,
    path = "/SupportTicket/{id}",
    params(("id" = i64, Path, description = "Ticket id")),
    responses((status = 200, body = SupportTicket), (status = 403), (status = 404)),
    tag = "Support"
)]
fn get_ticket_doc() {}

#[utoipa::path(
    post,
    path = "/SupportTicket",
    request_body = CreateTicketRequest,
    responses((status = 201, body = SupportTicket)),
    tag = "Support"
)]
fn create_ticket_doc() {}

#[utoipa::path(
    put,
    path = "/SupportTicket/{id}",
    params(("id" = i64, Path, description = "Ticket id")),
    request_body = UpdateTicketRequest,
    responses((status = 200, body = SupportTicket), (status = 400), (status = 403)),
    tag = "Support"
)]
fn update_ticket_doc() {}

#[utoipa::path(
    delete,
    path = "/SupportTicket/{id}",
    params(("id" = i64, Path, description = "Ticket id")),
    responses((status = 204), (status = 403), (status = 404)),
    tag = "Support"
)]
fn delete_ticket_doc() {}

#[utoipa::path(
    get,
    path = "/Chat",
    params(ChatQuery),
    responses((status = 200, body = [Chat]), (status = 403)),
    tag = "Support"
)]
fn list_chats_doc() {}

#[utoipa::path(
    post,
    path = "/Chat",
    request_body = PostChatRequest,
    responses(
        (status = 201, body = Chat),
        (status = 400, description = "Ticket is closed"),
        (status = 403)
    ),
    tag = "Support"
)]
fn post_chat_doc() {}

// ---- admin ----

#[utoipa::path(
    get,
    path = "/api/admin/activity-logs",
    params(ActivityLogQuery),
    responses((status = 200, body = [ActivityLog]), (status = 403)),
    tag = "Admin"
)]
fn admin_activity_logs_doc() {}
