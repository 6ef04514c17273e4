use chrono::Utc;
use criterion::{Criterion, criterion_group, criterion_main};
use domain::order::assemble;
use domain::{CreateOrder, OrderItemInput, OrderService, StockDemand, first_shortfall, order_total};
use store::{
    Category, InMemoryStore, LineItem, LineItemId, MarketplaceStore, Money, NewProduct, NewUser,
    OrderId, Preference, Product, ProductId, UserId,
};

fn catalog(size: usize) -> Vec<Product> {
    let now = Utc::now();
    (0..size)
        .map(|i| Product {
            id: ProductId::new(),
            name: format!("Product {i}"),
            description: "Benchmark product".to_string(),
            category: Category::Electronics,
            price: Money::from_cents(100 * (i as i64 + 1)),
            stock: 1_000,
            created_at: now,
            updated_at: now,
        })
        .collect()
}

fn request_for(user_id: UserId, products: &[Product]) -> CreateOrder {
    CreateOrder {
        user_id: user_id.to_string(),
        order_items: products
            .iter()
            .map(|p| OrderItemInput {
                product_id: p.id.to_string(),
                quantity: 2,
            })
            .collect(),
    }
}

fn bench_inventory_check(c: &mut Criterion) {
    let products = catalog(50);
    let demands: Vec<StockDemand> = products
        .iter()
        .map(|p| StockDemand {
            product_id: p.id,
            quantity: 3,
        })
        .collect();

    c.bench_function("domain/inventory_check_50_products", |b| {
        b.iter(|| first_shortfall(&demands, &products));
    });
}

fn bench_order_total(c: &mut Criterion) {
    let order_id = OrderId::new();
    let items: Vec<LineItem> = (0..100)
        .map(|i| LineItem {
            id: LineItemId::new(),
            order_id,
            product_id: ProductId::new(),
            quantity: (i % 5) + 1,
            unit_price: Money::from_cents(i64::from(i) * 37),
        })
        .collect();

    c.bench_function("domain/order_total_100_items", |b| {
        b.iter(|| order_total(&items));
    });
}

fn bench_assemble(c: &mut Criterion) {
    let products = catalog(20);
    let parsed = request_for(UserId::new(), &products).parse().unwrap();

    c.bench_function("domain/assemble_20_items", |b| {
        b.iter(|| assemble(&parsed, &products).unwrap());
    });
}

fn bench_create_order(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryStore::new();

    let (user_id, products) = rt.block_on(async {
        let user = store
            .create_user(NewUser {
                email: "bench@example.com".to_string(),
                first_name: "Bench".to_string(),
                last_name: "Mark".to_string(),
                address: "Nowhere".to_string(),
                preference: Preference::default(),
            })
            .await
            .unwrap();
        let mut products = Vec::new();
        for i in 0..5 {
            let product = store
                .create_product(NewProduct {
                    name: format!("Product {i}"),
                    description: "Benchmark product".to_string(),
                    category: Category::Electronics,
                    price: Money::from_cents(999),
                    stock: u32::MAX,
                })
                .await
                .unwrap();
            products.push(product);
        }
        (user.id, products)
    });
    let service = OrderService::new(store);

    c.bench_function("domain/create_order_5_items", |b| {
        b.iter(|| {
            rt.block_on(async {
                service
                    .create_order(request_for(user_id, &products))
                    .await
                    .unwrap();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_inventory_check,
    bench_order_total,
    bench_assemble,
    bench_create_order,
);
criterion_main!(benches);
