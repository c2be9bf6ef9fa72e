use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Products::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Products::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Products::Name).string().not_null())
                    .col(ColumnDef::new(Products::Sku).string().null())
                    .col(ColumnDef::new(Products::ImageUrl).string().null())
                    .col(ColumnDef::new(Products::Price).big_integer().not_null())
                    .col(ColumnDef::new(Products::Stock).integer().not_null().default(0))
                    .col(
                        ColumnDef::new(Products::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Orders::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Orders::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Orders::OrderNumber)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Orders::UserId).uuid().not_null())
                    .col(ColumnDef::new(Orders::CustomerName).string().not_null())
                    .col(ColumnDef::new(Orders::CustomerEmail).string().not_null())
                    .col(ColumnDef::new(Orders::CustomerPhone).string().null())
                    .col(ColumnDef::new(Orders::Status).string_len(20).not_null())
                    .col(ColumnDef::new(Orders::Subtotal).big_integer().not_null())
                    .col(ColumnDef::new(Orders::Tax).big_integer().not_null())
                    .col(ColumnDef::new(Orders::ShippingCost).big_integer().not_null())
                    .col(ColumnDef::new(Orders::Total).big_integer().not_null())
                    .col(ColumnDef::new(Orders::ShippingAddress).text().not_null())
                    .col(ColumnDef::new(Orders::PaymentMethod).string_len(20).not_null())
                    .col(ColumnDef::new(Orders::PaymentStatus).string_len(20).not_null())
                    .col(ColumnDef::new(Orders::TrackingNumber).string().null())
                    .col(ColumnDef::new(Orders::ShippedAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(Orders::DeliveredAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(Orders::CancelledAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(Orders::CancelledBy).string().null())
                    .col(ColumnDef::new(Orders::CancelledByRole).string_len(20).null())
                    .col(ColumnDef::new(Orders::CancellationReason).text().null())
                    .col(ColumnDef::new(Orders::ItemCount).integer().not_null())
                    .col(
                        ColumnDef::new(Orders::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Orders::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(OrderItems::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(OrderItems::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(OrderItems::OrderId).uuid().not_null())
                    .col(ColumnDef::new(OrderItems::LineNumber).integer().not_null())
                    .col(ColumnDef::new(OrderItems::ProductId).uuid().null())
                    .col(ColumnDef::new(OrderItems::ProductName).string().not_null())
                    .col(ColumnDef::new(OrderItems::Sku).string().null())
                    .col(ColumnDef::new(OrderItems::ImageUrl).string().null())
                    .col(ColumnDef::new(OrderItems::UnitPrice).big_integer().not_null())
                    .col(ColumnDef::new(OrderItems::Quantity).integer().not_null())
                    .col(ColumnDef::new(OrderItems::TotalPrice).big_integer().not_null())
                    .col(
                        ColumnDef::new(OrderItems::DiscountAmount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(OrderItems::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_items_order")
                            .from(OrderItems::Table, OrderItems::OrderId)
                            .to(Orders::Table, Orders::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_items_product")
                            .from(OrderItems::Table, OrderItems::ProductId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(OrderHistory::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(OrderHistory::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(OrderHistory::OrderId).uuid().not_null())
                    .col(ColumnDef::new(OrderHistory::PreviousStatus).string_len(20).null())
                    .col(ColumnDef::new(OrderHistory::NewStatus).string_len(20).not_null())
                    .col(ColumnDef::new(OrderHistory::ActorId).string().not_null())
                    .col(ColumnDef::new(OrderHistory::ActorEmail).string().null())
                    .col(ColumnDef::new(OrderHistory::ActorRole).string_len(20).not_null())
                    .col(ColumnDef::new(OrderHistory::Reason).text().null())
                    .col(
                        ColumnDef::new(OrderHistory::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_history_order")
                            .from(OrderHistory::Table, OrderHistory::OrderId)
                            .to(Orders::Table, Orders::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_orders_user_created")
                    .table(Orders::Table)
                    .col(Orders::UserId)
                    .col(Orders::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_order_items_order")
                    .table(OrderItems::Table)
                    .col(OrderItems::OrderId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_order_history_order")
                    .table(OrderHistory::Table)
                    .col(OrderHistory::OrderId)
                    .col(OrderHistory::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OrderHistory::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(OrderItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Orders::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Products::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Products {
    Table,
    Id,
    Name,
    Sku,
    ImageUrl,
    Price,
    Stock,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Orders {
    Table,
    Id,
    OrderNumber,
    UserId,
    CustomerName,
    CustomerEmail,
    CustomerPhone,
    Status,
    Subtotal,
    Tax,
    ShippingCost,
    Total,
    ShippingAddress,
    PaymentMethod,
    PaymentStatus,
    TrackingNumber,
    ShippedAt,
    DeliveredAt,
    CancelledAt,
    CancelledBy,
    CancelledByRole,
    CancellationReason,
    ItemCount,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum OrderItems {
    Table,
    Id,
    OrderId,
    LineNumber,
    ProductId,
    ProductName,
    Sku,
    ImageUrl,
    UnitPrice,
    Quantity,
    TotalPrice,
    DiscountAmount,
    CreatedAt,
}

#[derive(DeriveIden)]
enum OrderHistory {
    Table,
    Id,
    OrderId,
    PreviousStatus,
    NewStatus,
    ActorId,
    ActorEmail,
    ActorRole,
    Reason,
    CreatedAt,
}
