use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};

use pixelframe_storefront::{
    backend::session::hash_password,
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    entity::{
        Accounts, Electricians, Products, Profiles, Services,
        accounts::ActiveModel as AccountActive,
        electricians::ActiveModel as ElectricianActive,
        products::ActiveModel as ProductActive,
        profiles::ActiveModel as ProfileActive,
        services::ActiveModel as ServiceActive,
    },
    seed,
    telemetry::init_tracing,
};

const SEED_PASSWORD: &str = "pixelframe123";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    let config = AppConfig::from_env()?;
    let database_url = config
        .database_url
        .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is required to seed"))?;

    let orm = create_orm_conn(&database_url).await?;
    // Ensure migrations are applied.
    run_migrations(&orm).await?;

    seed_accounts(&orm).await?;
    seed_electricians(&orm).await?;
    seed_products(&orm).await?;
    seed_services(&orm).await?;

    println!("Seed completed. Every seed account signs in with `{SEED_PASSWORD}`");
    Ok(())
}

async fn seed_accounts(orm: &DatabaseConnection) -> anyhow::Result<()> {
    for identity in seed::seed_identities() {
        if Profiles::find_by_id(identity.id).one(orm).await?.is_some() {
            continue;
        }
        ProfileActive {
            id: Set(identity.id),
            name: Set(identity.name.clone()),
            email: Set(identity.email.clone()),
            phone: Set(identity.phone.clone()),
            location: Set(identity.location.map(|l| l.as_str().to_string())),
            role: Set(identity.role.as_str().to_string()),
            verified: Set(identity.verified),
            avatar_url: Set(identity.avatar.clone()),
            created_at: NotSet,
            updated_at: NotSet,
        }
        .insert(orm)
        .await?;

        if Accounts::find_by_id(identity.id).one(orm).await?.is_none() {
            AccountActive {
                id: Set(identity.id),
                email: Set(identity.email.clone()),
                password_hash: Set(hash_password(SEED_PASSWORD)?),
                created_at: NotSet,
            }
            .insert(orm)
            .await?;
        }
        println!("Ensured {} {}", identity.role, identity.email);
    }
    Ok(())
}

async fn seed_electricians(orm: &DatabaseConnection) -> anyhow::Result<()> {
    let availability = seed::seed_services();
    for electrician in seed::seed_electricians() {
        if Electricians::find_by_id(electrician.id).one(orm).await?.is_some() {
            continue;
        }
        let hours = availability
            .iter()
            .find(|s| s.electrician_id == electrician.id)
            .map(|s| s.availability.clone())
            .unwrap_or_default();
        ElectricianActive {
            id: Set(electrician.id),
            specialties: Set(electrician.specialties),
            experience_years: Set(electrician.experience_years as i32),
            rating: Set(f64::from(electrician.rating)),
            review_count: Set(electrician.review_count as i32),
            certifications: Set(electrician.certifications),
            service_areas: Set(electrician
                .service_areas
                .iter()
                .map(|l| l.as_str().to_string())
                .collect()),
            base_rate: Set(electrician.pricing.base_rate),
            onsite_rate: Set(electrician.pricing.on_site_rate),
            availability: Set(hours),
            shop_address: Set(None),
            created_at: NotSet,
            updated_at: NotSet,
        }
        .insert(orm)
        .await?;
    }
    println!("Seeded electricians");
    Ok(())
}

async fn seed_products(orm: &DatabaseConnection) -> anyhow::Result<()> {
    for product in seed::seed_products() {
        if Products::find_by_id(product.id).one(orm).await?.is_some() {
            continue;
        }
        ProductActive {
            id: Set(product.id),
            name: Set(product.name),
            description: Set(product.description),
            price: Set(product.price),
            category: Set(product.category.as_str().to_string()),
            brand: Set(product.brand),
            images: Set(product.images),
            seller_id: Set(product.seller_id),
            stock: Set(product.stock as i32),
            sold: Set(product.sold as i32),
            rating: Set(f64::from(product.rating)),
            review_count: Set(product.review_count as i32),
            specifications: Set(serde_json::to_value(&product.specifications)?),
            created_at: Set(product.created_at.into()),
            updated_at: NotSet,
        }
        .insert(orm)
        .await?;
    }
    println!("Seeded products");
    Ok(())
}

async fn seed_services(orm: &DatabaseConnection) -> anyhow::Result<()> {
    for service in seed::seed_services() {
        if Services::find_by_id(service.id).one(orm).await?.is_some() {
            continue;
        }
        ServiceActive {
            id: Set(service.id),
            name: Set(service.name),
            description: Set(service.description),
            category: Set(service.category.as_str().to_string()),
            electrician_id: Set(service.electrician_id),
            base_price: Set(service.base_price),
            onsite_price: Set(service.on_site_price),
            duration: Set(service.duration),
            active: Set(true),
            created_at: NotSet,
            updated_at: NotSet,
        }
        .insert(orm)
        .await?;
    }
    println!("Seeded services");
    Ok(())
}
