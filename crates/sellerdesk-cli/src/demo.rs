//! `sellerdesk demo` - インメモリのバックエンドで一通りの操作を実行する

use std::sync::Arc;

use anyhow::Result;
use chrono::{Days, Utc};
use sellerdesk_core::app::SellerConsole;
use sellerdesk_core::domain::{
    ApiError, ProductFilter, ProductForm, ProductStatus, SignInForm, Upload,
};
use sellerdesk_core::impls::{InMemoryMarketplace, InMemoryResponseCache};

use crate::render::{self, ConsoleNotifier};

pub async fn run() -> Result<()> {
    let market = Arc::new(InMemoryMarketplace::new());
    let toys = market.seed_category("Toys").await;
    market.seed_category("Home Decor").await;
    market.seed_seller("Demo Seller", "demo@sellerdesk.dev", "demo").await;

    let console = SellerConsole::new(
        market.clone(),
        Arc::new(InMemoryResponseCache::new()),
        Arc::new(ConsoleNotifier),
    );

    let me = console
        .sign_in(&SignInForm {
            email: "demo@sellerdesk.dev".into(),
            password: "demo".into(),
        })
        .await?;
    print!("{}", render::seller(&me));

    console.categories().await?;
    console.products(&ProductFilter::default()).await?;

    let mut created = Vec::new();
    for (title, price) in [("Wooden train", "49,90"), ("Kite", "19.5"), ("Puzzle", "12")] {
        let product = console
            .create_product(&ProductForm {
                title: title.into(),
                category_id: toys.id.to_string(),
                description: format!("{title}, in great shape"),
                price: price.into(),
                attachments: vec![Upload::from_path_name(format!("{title}.png"), vec![0x89])],
            })
            .await?;
        created.push(product);
    }

    let listing = console.products(&ProductFilter::default()).await?;
    print!("{}", render::product_rows(&listing.products));

    let train = &created[0];
    console.product(&train.id).await?;
    console.change_status(&train.id, ProductStatus::Sold).await?;

    // 不正な遷移はネットワークに出る前に止まる
    if let Err(err) = console.change_status(&train.id, ProductStatus::Cancelled).await {
        println!("rejected locally: {err}");
    }

    // サーバーに拒否された変更はロールバックされる
    let kite = &created[1];
    console.product(&kite.id).await?;
    market.fail_next(ApiError::application(400, "cannot sell")).await;
    let _ = console.change_status(&kite.id, ProductStatus::Sold).await;
    let kite_now = console.product(&kite.id).await?;
    println!("after rollback: {} is {}", kite_now.product.title, kite_now.product.status);

    let today = Utc::now().date_naive();
    for (offset, visits) in [(0u64, 3usize), (1, 5), (2, 1), (6, 2)] {
        let day = today.checked_sub_days(Days::new(offset)).unwrap_or(today);
        for _ in 0..visits {
            market.record_view(&created[(offset as usize) % created.len()].id, day).await;
        }
    }

    let metrics = console.dashboard().await?;
    print!("{}", render::dashboard(&metrics));

    console.sign_out().await?;
    Ok(())
}
