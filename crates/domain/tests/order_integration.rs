//! Integration tests for order creation and saved products.
//!
//! These run the domain services against the in-memory store and check the
//! stock, persistence and toggle guarantees end to end.

use std::sync::Arc;

use domain::{
    CreateOrder, CreateProduct, CreateUser, DomainError, OrderItemInput, OrderService, PatchProduct,
    PreferenceInput, ProductService, SavedProductService, ToggleSavedProduct, UserService,
};
use store::{Category, InMemoryStore, MarketplaceStoreExt, Money, Product, ProductId, User};

struct Fixture {
    store: InMemoryStore,
    orders: OrderService<InMemoryStore>,
    products: ProductService<InMemoryStore>,
    users: UserService<InMemoryStore>,
    saved: SavedProductService<InMemoryStore>,
}

fn fixture() -> Fixture {
    let store = InMemoryStore::new();
    Fixture {
        orders: OrderService::new(store.clone()),
        products: ProductService::new(store.clone()),
        users: UserService::new(store.clone()),
        saved: SavedProductService::new(store.clone()),
        store,
    }
}

impl Fixture {
    async fn user(&self, email: &str) -> User {
        self.users
            .create_user(CreateUser {
                email: email.to_string(),
                first_name: "Jisoo".to_string(),
                last_name: "Park".to_string(),
                address: "Incheon".to_string(),
                user_preference: PreferenceInput::default(),
            })
            .await
            .unwrap()
    }

    async fn product(&self, name: &str, price: i64, stock: i64) -> Product {
        self.products
            .create_product(CreateProduct {
                name: name.to_string(),
                description: format!("{name} for testing"),
                category: Category::Electronics,
                price,
                stock,
            })
            .await
            .unwrap()
    }

    async fn stock(&self, id: ProductId) -> u32 {
        self.store.require_product(id).await.unwrap().stock
    }
}

fn order(user: &User, lines: &[(&Product, i64)]) -> CreateOrder {
    CreateOrder {
        user_id: user.id.to_string(),
        order_items: lines
            .iter()
            .map(|(product, quantity)| OrderItemInput {
                product_id: product.id.to_string(),
                quantity: *quantity,
            })
            .collect(),
    }
}

mod order_creation {
    use super::*;

    #[tokio::test]
    async fn stock_decreases_only_for_ordered_products() {
        let fx = fixture();
        let user = fx.user("a@example.com").await;
        let phone = fx.product("Phone", 59900, 10).await;
        let cable = fx.product("Cable", 900, 40).await;
        let other = fx.product("Speaker", 12000, 7).await;

        let created = fx
            .orders
            .create_order(order(&user, &[(&phone, 2), (&cable, 5)]))
            .await
            .unwrap();

        assert_eq!(created.items.len(), 2);
        assert_eq!(fx.stock(phone.id).await, 8);
        assert_eq!(fx.stock(cable.id).await, 35);
        assert_eq!(fx.stock(other.id).await, 7);
    }

    #[tokio::test]
    async fn second_order_exceeding_remaining_stock_is_rejected() {
        let fx = fixture();
        let user = fx.user("a@example.com").await;
        let lamp = fx.product("Lamp", 3000, 5).await;

        fx.orders
            .create_order(order(&user, &[(&lamp, 3)]))
            .await
            .unwrap();
        assert_eq!(fx.stock(lamp.id).await, 2);

        let err = fx
            .orders
            .create_order(order(&user, &[(&lamp, 3)]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DomainError::InsufficientStock {
                requested: 3,
                available: 2,
                ..
            }
        ));
        assert_eq!(fx.stock(lamp.id).await, 2);
        assert_eq!(fx.store.order_count().await, 1);
    }

    #[tokio::test]
    async fn one_short_product_fails_the_whole_order() {
        let fx = fixture();
        let user = fx.user("a@example.com").await;
        let plenty = fx.product("Plenty", 100, 50).await;
        let scarce = fx.product("Scarce", 100, 1).await;

        let err = fx
            .orders
            .create_order(order(&user, &[(&plenty, 10), (&scarce, 2)]))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::InsufficientStock { product_id, .. } if product_id == scarce.id));
        assert_eq!(fx.stock(plenty.id).await, 50);
        assert_eq!(fx.stock(scarce.id).await, 1);
        assert_eq!(fx.store.order_count().await, 0);
        assert_eq!(fx.store.line_item_count().await, 0);
    }

    #[tokio::test]
    async fn repeated_product_lines_are_checked_together() {
        let fx = fixture();
        let user = fx.user("a@example.com").await;
        let mug = fx.product("Mug", 800, 4).await;

        let err = fx
            .orders
            .create_order(order(&user, &[(&mug, 3), (&mug, 2)]))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::InsufficientStock { requested: 5, .. }));
        assert_eq!(fx.stock(mug.id).await, 4);
    }

    #[tokio::test]
    async fn repeated_lines_summing_past_u32_are_rejected() {
        let fx = fixture();
        let user = fx.user("a@example.com").await;
        let mug = fx.product("Mug", 800, 5).await;
        let half = 1i64 << 31;

        let err = fx
            .orders
            .create_order(order(&user, &[(&mug, half), (&mug, half)]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DomainError::InsufficientStock {
                requested: 4_294_967_296,
                available: 5,
                ..
            }
        ));
        assert_eq!(fx.stock(mug.id).await, 5);
        assert_eq!(fx.store.order_count().await, 0);
    }

    #[tokio::test]
    async fn order_whose_total_overflows_is_rejected() {
        let fx = fixture();
        let user = fx.user("a@example.com").await;
        let yacht = fx.product("Yacht", i64::MAX / 2, 5).await;

        let err = fx
            .orders
            .create_order(order(&user, &[(&yacht, 3)]))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(fx.stock(yacht.id).await, 5);
        assert_eq!(fx.store.order_count().await, 0);
        assert!(fx.orders.list_orders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_user_is_not_found_and_stock_is_kept() {
        let fx = fixture();
        let lamp = fx.product("Lamp", 3000, 5).await;

        let request = CreateOrder {
            user_id: store::UserId::new().to_string(),
            order_items: vec![OrderItemInput {
                product_id: lamp.id.to_string(),
                quantity: 1,
            }],
        };
        let err = fx.orders.create_order(request).await.unwrap_err();

        assert!(matches!(err, DomainError::NotFound { entity: "User", .. }));
        assert_eq!(fx.stock(lamp.id).await, 5);
    }

    #[tokio::test]
    async fn malformed_request_is_a_validation_error() {
        let fx = fixture();
        let user = fx.user("a@example.com").await;
        let lamp = fx.product("Lamp", 3000, 5).await;

        let err = fx
            .orders
            .create_order(order(&user, &[(&lamp, 0)]))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = fx.orders.create_order(order(&user, &[])).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}

mod totals {
    use super::*;

    #[tokio::test]
    async fn total_uses_snapshot_prices_after_price_change() {
        let fx = fixture();
        let user = fx.user("a@example.com").await;
        let desk = fx.product("Desk", 15000, 3).await;
        let chair = fx.product("Chair", 7000, 3).await;

        let created = fx
            .orders
            .create_order(order(&user, &[(&desk, 1), (&chair, 2)]))
            .await
            .unwrap();

        fx.products
            .update_product(
                desk.id,
                PatchProduct {
                    price: Some(99999),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let priced = fx.orders.get_order(created.id).await.unwrap();
        assert_eq!(priced.total, Money::from_cents(29000));

        let listed = fx.orders.list_user_orders(user.id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].total, Money::from_cents(29000));
    }

    #[tokio::test]
    async fn user_orders_for_unknown_user_is_not_found() {
        let fx = fixture();
        let err = fx
            .orders
            .list_user_orders(store::UserId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }
}

mod concurrency {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_orders_never_oversell() {
        let fx = fixture();
        let user = fx.user("a@example.com").await;
        let hot = fx.product("Limited", 5000, 7).await;
        let orders = Arc::new(OrderService::new(fx.store.clone()));

        let mut handles = Vec::new();
        for _ in 0..30 {
            let orders = orders.clone();
            let request = order(&user, &[(&hot, 1)]);
            handles.push(tokio::spawn(
                async move { orders.create_order(request).await },
            ));
        }

        let mut succeeded = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(DomainError::InsufficientStock { .. }) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(succeeded, 7);
        assert_eq!(fx.stock(hot.id).await, 0);
        assert_eq!(fx.store.order_count().await, 7);
    }
}

mod saved_products {
    use super::*;

    fn toggle(product: &Product) -> ToggleSavedProduct {
        ToggleSavedProduct {
            product_id: product.id.to_string(),
        }
    }

    #[tokio::test]
    async fn toggling_twice_restores_membership() {
        let fx = fixture();
        let user = fx.user("a@example.com").await;
        let kept = fx.product("Kept", 100, 1).await;
        let flipped = fx.product("Flipped", 200, 1).await;

        fx.saved.toggle(user.id, toggle(&kept)).await.unwrap();

        let after_first = fx.saved.toggle(user.id, toggle(&flipped)).await.unwrap();
        let ids: Vec<_> = after_first.iter().map(|p| p.id).collect();
        assert!(ids.contains(&flipped.id));
        assert!(ids.contains(&kept.id));

        let after_second = fx.saved.toggle(user.id, toggle(&flipped)).await.unwrap();
        let ids: Vec<_> = after_second.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![kept.id]);

        assert_eq!(fx.saved.list(user.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn toggle_for_unknown_user_or_product_is_not_found() {
        let fx = fixture();
        let user = fx.user("a@example.com").await;
        let product = fx.product("Thing", 100, 1).await;

        let err = fx
            .saved
            .toggle(store::UserId::new(), toggle(&product))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "User", .. }));

        let err = fx
            .saved
            .toggle(
                user.id,
                ToggleSavedProduct {
                    product_id: ProductId::new().to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "Product", .. }));
    }

    #[tokio::test]
    async fn malformed_product_id_is_a_validation_error() {
        let fx = fixture();
        let user = fx.user("a@example.com").await;

        let err = fx
            .saved
            .toggle(
                user.id,
                ToggleSavedProduct {
                    product_id: "123".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
