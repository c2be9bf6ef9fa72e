use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::retry_on_conflict,
    dto::orders::{
        CancelOrderRequest, CreateOrderItem, CreateOrderRequest, CreatedOrder, OrderDetails,
        StockCheckRequest,
    },
    entity::{
        order_history::{ActiveModel as HistoryActive, Column as HistoryCol, Entity as OrderHistory},
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        products::{Column as ProdCol, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult, conflict_on_unique, is_unique_violation},
    middleware::auth::AuthUser,
    models::{
        Actor, ActorRole, Order, history_from_entity, order_from_entity, order_item_from_entity,
    },
    order_number::generate_order_number,
    order_status::{OrderStatus, validate_transition},
    pricing::{OrderTotals, line_total},
    response::Meta,
    routes::params::{OrderListQuery, SortOrder},
    state::AppState,
    stock::{StockCheckItem, StockValidation, validate_stock},
};

const PAYMENT_METHOD_COD: &str = "cod";
const PAYMENT_STATUS_PENDING: &str = "pending";
const DEFAULT_CANCEL_REASON: &str = "No reason provided";

/// A requested status change, as handed over by the HTTP layer.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub new_status: OrderStatus,
    pub actor: Actor,
    pub reason: Option<String>,
    pub tracking_number: Option<String>,
}

/// Turn a checkout into a `pending` order, reserving stock for every line.
pub async fn create_order(
    state: &AppState,
    user_id: Uuid,
    payload: CreateOrderRequest,
) -> AppResult<CreatedOrder> {
    payload.validate()?;
    let requested = requested_quantities(&payload.items)?;

    // Fast feedback only; stock is checked again under lock below.
    let advisory = stock_levels(&state.orm, &requested, &payload.items).await?;
    if let Some(short) = advisory.invalid_items.first() {
        tracing::info!(product_id = %short.product_id, "checkout rejected by stock pre-check");
        return Err(insufficient_stock(short));
    }

    let payload = &payload;
    let requested = &requested;
    let created = retry_on_conflict(state.orders.max_txn_attempts, "create_order", move || {
        create_order_txn(state, user_id, payload, requested)
    })
    .await?;

    tracing::info!(
        order_id = %created.order_id,
        order_number = %created.order_number,
        %user_id,
        "order created"
    );
    Ok(created)
}

async fn create_order_txn(
    state: &AppState,
    user_id: Uuid,
    payload: &CreateOrderRequest,
    requested: &BTreeMap<Uuid, i32>,
) -> AppResult<CreatedOrder> {
    let txn = state.orm.begin().await?;

    // Lock in id order so concurrent checkouts over the same products queue up
    // instead of deadlocking.
    let products: HashMap<Uuid, ProductModel> = Products::find()
        .filter(ProdCol::Id.is_in(requested.keys().copied()))
        .order_by_asc(ProdCol::Id)
        .lock(LockType::Update)
        .all(&txn)
        .await?
        .into_iter()
        .map(|product| (product.id, product))
        .collect();

    for (product_id, quantity) in requested {
        let available = products.get(product_id).map_or(0, |p| p.stock);
        if available < *quantity {
            return Err(AppError::InsufficientStock {
                product_id: *product_id,
                product_name: display_name(*product_id, &products, &payload.items),
                available,
                requested: *quantity,
            });
        }
    }

    let now: DateTimeWithTimeZone = Utc::now().into();
    let order_id = Uuid::new_v4();

    let mut items = Vec::with_capacity(payload.items.len());
    let mut line_totals = Vec::with_capacity(payload.items.len());
    for (line_number, line) in (1..).zip(&payload.items) {
        let product = products.get(&line.product_id).ok_or(AppError::NotFound)?;
        if line.unit_price.is_some_and(|price| price != product.price) {
            tracing::info!(
                product_id = %product.id,
                client_price = ?line.unit_price,
                catalog_price = product.price,
                "client price differs from catalog, using catalog price"
            );
        }
        let total_price = line_total(product.price, line.quantity)?;
        line_totals.push(total_price);
        items.push(OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id),
            line_number: Set(line_number),
            product_id: Set(Some(product.id)),
            product_name: Set(product.name.clone()),
            sku: Set(product.sku.clone().or_else(|| line.sku.clone())),
            image_url: Set(product.image_url.clone().or_else(|| line.image_url.clone())),
            unit_price: Set(product.price),
            quantity: Set(line.quantity),
            total_price: Set(total_price),
            discount_amount: Set(0),
            created_at: Set(now),
        });
    }

    let totals = OrderTotals::compute(&line_totals, &state.orders.totals)?;

    let order_number = generate_order_number(&state.orders.order_number_prefix, Utc::now());
    let item_count = i32::try_from(items.len())
        .map_err(|_| AppError::Validation("too many order lines".into()))?;

    let order = OrderActive {
        id: Set(order_id),
        order_number: Set(order_number.clone()),
        user_id: Set(user_id),
        customer_name: Set(payload.customer_name.trim().to_string()),
        customer_email: Set(payload.customer_email.trim().to_string()),
        customer_phone: Set(payload.customer_phone.clone()),
        status: Set(OrderStatus::Pending.as_str().to_string()),
        subtotal: Set(totals.subtotal),
        tax: Set(totals.tax),
        shipping_cost: Set(totals.shipping_cost),
        total: Set(totals.total),
        shipping_address: Set(payload.shipping_address.trim().to_string()),
        payment_method: Set(PAYMENT_METHOD_COD.to_string()),
        payment_status: Set(PAYMENT_STATUS_PENDING.to_string()),
        tracking_number: Set(None),
        shipped_at: Set(None),
        delivered_at: Set(None),
        cancelled_at: Set(None),
        cancelled_by: Set(None),
        cancelled_by_role: Set(None),
        cancellation_reason: Set(None),
        item_count: Set(item_count),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Orders::insert(order)
        .exec_without_returning(&txn)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                tracing::warn!(%order_number, "order number collision");
            }
            conflict_on_unique(err)
        })?;

    OrderItems::insert_many(items)
        .exec_without_returning(&txn)
        .await?;

    for (product_id, quantity) in requested {
        let result = Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(*quantity))
            .filter(ProdCol::Id.eq(*product_id))
            .filter(ProdCol::Stock.gte(*quantity))
            .exec(&txn)
            .await?;
        if result.rows_affected != 1 {
            return Err(AppError::InsufficientStock {
                product_id: *product_id,
                product_name: display_name(*product_id, &products, &payload.items),
                available: products.get(product_id).map_or(0, |p| p.stock),
                requested: *quantity,
            });
        }
    }

    append_history(
        &txn,
        order_id,
        None,
        OrderStatus::Pending,
        &Actor::system(),
        Some("Order created"),
        now,
    )
    .await?;

    txn.commit().await?;

    Ok(CreatedOrder {
        order_id,
        order_number,
    })
}

/// Apply a status change on behalf of `change.actor`.
///
/// The order is read twice: once here for a quick answer, and again inside the
/// transaction, where the decision that counts is made.
pub async fn update_order_status(
    state: &AppState,
    order_id: Uuid,
    change: StatusChange,
) -> AppResult<Order> {
    let current = Orders::find_by_id(order_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    check_change(current.status.parse()?, &change)?;

    let change = &change;
    retry_on_conflict(
        state.orders.max_txn_attempts,
        "update_order_status",
        move || apply_status_change(state, order_id, change),
    )
    .await?;

    let order = Orders::find_by_id(order_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let order = order_from_entity(order)?;

    tracing::info!(
        order_id = %order.id,
        status = %order.status,
        actor = %change.actor.id,
        "order status updated"
    );
    Ok(order)
}

/// The atomic part of a status change. Runs every check against the row as
/// locked by this transaction, independent of what any caller saw earlier.
pub async fn apply_status_change(
    state: &AppState,
    order_id: Uuid,
    change: &StatusChange,
) -> AppResult<()> {
    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(order_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    let previous: OrderStatus = order.status.parse()?;
    check_change(previous, change)?;

    let cancelling = change.new_status == OrderStatus::Cancelled;
    let restock = if cancelling {
        OrderItems::find()
            .filter(OrderItemCol::OrderId.eq(order_id))
            .all(&txn)
            .await?
    } else {
        Vec::new()
    };

    let now: DateTimeWithTimeZone = Utc::now().into();
    let mut update = Orders::update_many()
        .col_expr(OrderCol::Status, Expr::value(change.new_status.as_str()))
        .col_expr(OrderCol::UpdatedAt, Expr::value(now))
        .filter(OrderCol::Id.eq(order_id))
        .filter(OrderCol::Status.eq(previous.as_str()));
    match change.new_status {
        OrderStatus::Cancelled => {
            let reason = change
                .reason
                .clone()
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CANCEL_REASON.to_string());
            update = update
                .col_expr(OrderCol::CancelledAt, Expr::value(now))
                .col_expr(OrderCol::CancelledBy, Expr::value(change.actor.id.clone()))
                .col_expr(OrderCol::CancelledByRole, Expr::value(change.actor.role.as_str()))
                .col_expr(OrderCol::CancellationReason, Expr::value(reason));
        }
        OrderStatus::Shipped => {
            update = update.col_expr(OrderCol::ShippedAt, Expr::value(now));
            if let Some(tracking) = &change.tracking_number {
                update = update.col_expr(OrderCol::TrackingNumber, Expr::value(tracking.clone()));
            }
        }
        OrderStatus::Delivered => {
            update = update.col_expr(OrderCol::DeliveredAt, Expr::value(now));
        }
        _ => {}
    }
    let result = update.exec(&txn).await?;
    if result.rows_affected != 1 {
        return Err(AppError::ConcurrencyConflict);
    }

    for item in restock {
        let Some(product_id) = item.product_id else {
            tracing::debug!(order_item_id = %item.id, "item has no product, skipping restock");
            continue;
        };
        Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).add(item.quantity))
            .filter(ProdCol::Id.eq(product_id))
            .exec(&txn)
            .await?;
    }

    append_history(
        &txn,
        order_id,
        Some(previous),
        change.new_status,
        &change.actor,
        change.reason.as_deref(),
        now,
    )
    .await?;

    txn.commit().await?;
    Ok(())
}

/// Customer self-service cancellation.
pub async fn cancel_order(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
    payload: CancelOrderRequest,
) -> AppResult<Order> {
    payload.validate()?;
    let owned = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(order_id)),
        )
        .count(&state.orm)
        .await?;
    if owned == 0 {
        return Err(AppError::NotFound);
    }

    update_order_status(
        state,
        order_id,
        StatusChange {
            new_status: OrderStatus::Cancelled,
            actor: Actor {
                role: ActorRole::Customer,
                ..user.actor()
            },
            reason: payload.reason,
            tracking_number: None,
        },
    )
    .await
}

/// Order with its items and history, or `None` when the order does not exist.
pub async fn get_order_details(
    conn: &DatabaseConnection,
    order_id: Uuid,
) -> AppResult<Option<OrderDetails>> {
    let (order, items, history) = tokio::try_join!(
        Orders::find_by_id(order_id).one(conn),
        OrderItems::find()
            .filter(OrderItemCol::OrderId.eq(order_id))
            .order_by_asc(OrderItemCol::LineNumber)
            .all(conn),
        OrderHistory::find()
            .filter(HistoryCol::OrderId.eq(order_id))
            .order_by_asc(HistoryCol::CreatedAt)
            .order_by_asc(HistoryCol::Id)
            .all(conn),
    )?;

    let Some(order) = order else {
        return Ok(None);
    };

    Ok(Some(OrderDetails {
        order: order_from_entity(order)?,
        items: items.into_iter().map(order_item_from_entity).collect(),
        history: history
            .into_iter()
            .map(history_from_entity)
            .collect::<AppResult<_>>()?,
    }))
}

/// Details of one of the caller's own orders; other users' orders are reported as missing.
pub async fn get_order(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<OrderDetails> {
    match get_order_details(&state.orm, id).await? {
        Some(details) if details.order.user_id == user.user_id => Ok(details),
        _ => Err(AppError::NotFound),
    }
}

pub async fn list_orders(
    state: &AppState,
    user_id: Option<Uuid>,
    query: OrderListQuery,
) -> AppResult<(Vec<Order>, Meta)> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();
    if let Some(user_id) = user_id {
        condition = condition.add(OrderCol::UserId.eq(user_id));
    }
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status.as_str()));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect::<AppResult<Vec<_>>>()?;

    Ok((orders, Meta::new(page, limit, total)))
}

/// Advisory stock check for the cart page.
pub async fn check_stock(state: &AppState, payload: StockCheckRequest) -> AppResult<StockValidation> {
    payload.validate()?;
    let mut requested: BTreeMap<Uuid, i32> = BTreeMap::new();
    for line in &payload.items {
        add_quantity(&mut requested, line.product_id, line.quantity)?;
    }
    stock_levels(&state.orm, &requested, &[]).await
}

/// Rejects changes that are illegal from `previous`, including the rule that
/// customers may only cancel, and only before processing starts.
fn check_change(previous: OrderStatus, change: &StatusChange) -> AppResult<()> {
    if previous.is_terminal() {
        return Err(AppError::TerminalState(previous));
    }
    validate_transition(previous, change.new_status)?;
    if change.actor.role == ActorRole::Customer {
        if change.new_status != OrderStatus::Cancelled {
            return Err(AppError::Forbidden);
        }
        if !previous.allows_self_cancel() {
            return Err(AppError::SelfCancelNotAllowed(previous));
        }
    }
    Ok(())
}

async fn append_history<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
    previous: Option<OrderStatus>,
    new_status: OrderStatus,
    actor: &Actor,
    reason: Option<&str>,
    at: DateTimeWithTimeZone,
) -> AppResult<()> {
    let entry = HistoryActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order_id),
        previous_status: Set(previous.map(|s| s.as_str().to_string())),
        new_status: Set(new_status.as_str().to_string()),
        actor_id: Set(actor.id.clone()),
        actor_email: Set(actor.email.clone()),
        actor_role: Set(actor.role.as_str().to_string()),
        reason: Set(reason.map(str::to_string)),
        created_at: Set(at),
    };
    OrderHistory::insert(entry).exec_without_returning(conn).await?;
    Ok(())
}

/// Total requested quantity per product, for carts that list a product twice.
fn requested_quantities(items: &[CreateOrderItem]) -> AppResult<BTreeMap<Uuid, i32>> {
    let mut requested = BTreeMap::new();
    for item in items {
        add_quantity(&mut requested, item.product_id, item.quantity)?;
    }
    Ok(requested)
}

fn add_quantity(requested: &mut BTreeMap<Uuid, i32>, product_id: Uuid, quantity: i32) -> AppResult<()> {
    if quantity <= 0 {
        return Err(AppError::Validation(format!(
            "quantity for product {product_id} must be positive"
        )));
    }
    let entry = requested.entry(product_id).or_insert(0);
    *entry = entry
        .checked_add(quantity)
        .ok_or_else(|| AppError::Validation("quantity is out of range".into()))?;
    Ok(())
}

async fn stock_levels<C: ConnectionTrait>(
    conn: &C,
    requested: &BTreeMap<Uuid, i32>,
    hints: &[CreateOrderItem],
) -> AppResult<StockValidation> {
    let products: HashMap<Uuid, ProductModel> = Products::find()
        .filter(ProdCol::Id.is_in(requested.keys().copied()))
        .all(conn)
        .await?
        .into_iter()
        .map(|product| (product.id, product))
        .collect();

    let items = requested
        .iter()
        .map(|(product_id, quantity)| StockCheckItem {
            product_id: *product_id,
            product_name: display_name(*product_id, &products, hints),
            requested_quantity: *quantity,
            available_stock: products.get(product_id).map_or(0, |p| p.stock),
        })
        .collect();
    Ok(validate_stock(items))
}

fn display_name(
    product_id: Uuid,
    products: &HashMap<Uuid, ProductModel>,
    hints: &[CreateOrderItem],
) -> String {
    products
        .get(&product_id)
        .map(|p| p.name.clone())
        .or_else(|| {
            hints
                .iter()
                .find(|item| item.product_id == product_id)
                .and_then(|item| item.product_name.clone())
        })
        .unwrap_or_else(|| format!("product {product_id}"))
}

fn insufficient_stock(item: &StockCheckItem) -> AppError {
    AppError::InsufficientStock {
        product_id: item.product_id,
        product_name: item.product_name.clone(),
        available: item.available_stock,
        requested: item.requested_quantity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(product_id: Uuid, quantity: i32) -> CreateOrderItem {
        CreateOrderItem {
            product_id,
            product_name: Some("Copper wire 1.5mm".into()),
            sku: None,
            image_url: None,
            unit_price: None,
            quantity,
        }
    }

    fn change(new_status: OrderStatus, role: ActorRole) -> StatusChange {
        StatusChange {
            new_status,
            actor: Actor {
                id: Uuid::new_v4().to_string(),
                email: None,
                role,
            },
            reason: None,
            tracking_number: None,
        }
    }

    #[test]
    fn repeated_products_are_summed() {
        let wire = Uuid::new_v4();
        let switch = Uuid::new_v4();
        let requested =
            requested_quantities(&[line(wire, 2), line(switch, 1), line(wire, 3)]).unwrap();
        assert_eq!(requested.get(&wire), Some(&5));
        assert_eq!(requested.get(&switch), Some(&1));
    }

    #[test]
    fn non_positive_quantity_is_rejected() {
        let result = requested_quantities(&[line(Uuid::new_v4(), 0)]);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn customers_may_only_cancel_early() {
        use OrderStatus::*;
        assert!(check_change(Pending, &change(Cancelled, ActorRole::Customer)).is_ok());
        assert!(check_change(Confirmed, &change(Cancelled, ActorRole::Customer)).is_ok());
        assert!(matches!(
            check_change(Shipped, &change(Cancelled, ActorRole::Customer)),
            Err(AppError::SelfCancelNotAllowed(Shipped))
        ));
        assert!(matches!(
            check_change(Pending, &change(Confirmed, ActorRole::Customer)),
            Err(AppError::Forbidden)
        ));
        assert!(check_change(Shipped, &change(Cancelled, ActorRole::Admin)).is_ok());
    }

    #[test]
    fn terminal_check_comes_first() {
        assert!(matches!(
            check_change(OrderStatus::Cancelled, &change(OrderStatus::Cancelled, ActorRole::Admin)),
            Err(AppError::TerminalState(OrderStatus::Cancelled))
        ));
    }

    #[test]
    fn unknown_product_falls_back_to_hint_name() {
        let id = Uuid::new_v4();
        assert_eq!(display_name(id, &HashMap::new(), &[line(id, 1)]), "Copper wire 1.5mm");
        assert_eq!(
            display_name(id, &HashMap::new(), &[]),
            format!("product {id}")
        );
    }
}
