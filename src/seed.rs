//! Built-in catalog used when the hosted backend cannot be reached, and the
//! rows the `seed` binary loads into a fresh database.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::enums::{Location, ProductCategory, Role, ServiceCategory};
use crate::models::{ElectricianProfile, Identity, Product, RatePair, Service, DEFAULT_SHOP_ADDRESS};

pub const TECHHUB_KENYA: Uuid = Uuid::from_u128(0x5e11e4_0000_4000_8000_000000000001);
pub const NAIROBI_ELECTRONICS: Uuid = Uuid::from_u128(0x5e11e4_0000_4000_8000_000000000002);
pub const AUDIO_WORLD: Uuid = Uuid::from_u128(0x5e11e4_0000_4000_8000_000000000003);

pub const JOHN_MWANGI: Uuid = Uuid::from_u128(0xe1ec_0000_4000_8000_000000000001);
pub const GRACE_WANJIKU: Uuid = Uuid::from_u128(0xe1ec_0000_4000_8000_000000000002);
pub const DAVID_KIPKEMOI: Uuid = Uuid::from_u128(0xe1ec_0000_4000_8000_000000000003);

const PRODUCT_BASE: u128 = 0x9a0d_0000_4000_8000_000000000000;
const SERVICE_BASE: u128 = 0x5e4c_0000_4000_8000_000000000000;

pub fn product_id(n: u128) -> Uuid {
    Uuid::from_u128(PRODUCT_BASE + n)
}

pub fn service_id(n: u128) -> Uuid {
    Uuid::from_u128(SERVICE_BASE + n)
}

fn at(timestamp: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(timestamp, 0).unwrap_or_default()
}

fn specs(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn seed_products() -> Vec<Product> {
    vec![
        Product {
            id: product_id(1),
            name: "Samsung Galaxy S24 Ultra".into(),
            description: "Latest flagship smartphone with advanced AI features and S Pen".into(),
            price: 120_000,
            category: ProductCategory::MobilePhones,
            brand: "Samsung".into(),
            images: strings(&["https://images.pexels.com/photos/699122/pexels-photo-699122.jpeg"]),
            seller_id: TECHHUB_KENYA,
            seller_name: "TechHub Kenya".into(),
            stock: 15,
            sold: 8,
            rating: 4.8,
            review_count: 24,
            specifications: specs(&[
                ("Display", "6.8\" Dynamic AMOLED 2X"),
                ("RAM", "12GB"),
                ("Storage", "256GB"),
                ("Camera", "200MP + 50MP + 12MP + 10MP"),
            ]),
            created_at: at(1_736_899_200),
        },
        Product {
            id: product_id(2),
            name: "Dell XPS 13 Core i7 11th Gen".into(),
            description: "Ultra-portable laptop perfect for professionals and students".into(),
            price: 85_000,
            category: ProductCategory::LaptopsAndComputers,
            brand: "Dell".into(),
            images: strings(&["https://images.pexels.com/photos/205421/pexels-photo-205421.jpeg"]),
            seller_id: NAIROBI_ELECTRONICS,
            seller_name: "Nairobi Electronics".into(),
            stock: 8,
            sold: 12,
            rating: 4.6,
            review_count: 18,
            specifications: specs(&[
                ("Processor", "Intel Core i7-1165G7"),
                ("RAM", "16GB DDR4"),
                ("Storage", "512GB SSD"),
                ("Display", "13.3\" FHD+"),
            ]),
            created_at: at(1_736_812_800),
        },
        Product {
            id: product_id(3),
            name: "Sony WH-1000XM5 Headphones".into(),
            description: "Premium noise-canceling wireless headphones".into(),
            price: 28_000,
            category: ProductCategory::AudioAndVideo,
            brand: "Sony".into(),
            images: strings(&["https://images.pexels.com/photos/3394650/pexels-photo-3394650.jpeg"]),
            seller_id: AUDIO_WORLD,
            seller_name: "Audio World".into(),
            stock: 0,
            sold: 25,
            rating: 4.9,
            review_count: 45,
            specifications: specs(&[
                ("Type", "Over-ear, Wireless"),
                ("Battery", "30 hours with ANC"),
                ("Driver", "30mm"),
                ("Connectivity", "Bluetooth 5.2, USB-C"),
            ]),
            created_at: at(1_736_726_400),
        },
        Product {
            id: product_id(4),
            name: "LG 55\" 4K Smart TV".into(),
            description: "Crystal clear 4K display with smart TV features".into(),
            price: 65_000,
            category: ProductCategory::HomeAppliances,
            brand: "LG".into(),
            images: strings(&["https://images.pexels.com/photos/1444416/pexels-photo-1444416.jpeg"]),
            seller_id: TECHHUB_KENYA,
            seller_name: "TechHub Kenya".into(),
            stock: 5,
            sold: 3,
            rating: 4.7,
            review_count: 12,
            specifications: specs(&[
                ("Screen Size", "55 inches"),
                ("Resolution", "4K UHD (3840x2160)"),
                ("Smart TV", "webOS"),
                ("HDR", "HDR10, Dolby Vision"),
            ]),
            created_at: at(1_736_640_000),
        },
    ]
}

pub fn seed_electricians() -> Vec<ElectricianProfile> {
    vec![
        ElectricianProfile {
            id: JOHN_MWANGI,
            name: "John Mwangi".into(),
            email: "john.mwangi@gmail.com".into(),
            phone: "+254712345678".into(),
            specialties: strings(&["TV Repair", "Home Wiring", "Appliance Installation"]),
            experience_years: 8,
            rating: 4.9,
            review_count: 156,
            avatar: Some("https://images.pexels.com/photos/1516680/pexels-photo-1516680.jpeg".into()),
            certifications: strings(&["Certified Electronics Technician", "Home Wiring Specialist"]),
            service_areas: vec![
                Location::NairobiCbd,
                Location::Westlands,
                Location::Karen,
                Location::Kilimani,
            ],
            pricing: RatePair {
                base_rate: 2_500,
                on_site_rate: 4_000,
            },
        },
        ElectricianProfile {
            id: GRACE_WANJIKU,
            name: "Grace Wanjiku".into(),
            email: "grace.wanjiku@gmail.com".into(),
            phone: "+254723456789".into(),
            specialties: strings(&["Mobile Phone Repair", "Computer Repair", "Networking"]),
            experience_years: 6,
            rating: 4.8,
            review_count: 98,
            avatar: Some("https://images.pexels.com/photos/1181690/pexels-photo-1181690.jpeg".into()),
            certifications: strings(&["Mobile Repair Specialist", "Network+ Certified"]),
            service_areas: vec![
                Location::Kasarani,
                Location::Thika,
                Location::Kiambu,
                Location::NairobiCbd,
            ],
            pricing: RatePair {
                base_rate: 2_000,
                on_site_rate: 3_500,
            },
        },
        ElectricianProfile {
            id: DAVID_KIPKEMOI,
            name: "David Kipkemoi".into(),
            email: "david.kipkemoi@gmail.com".into(),
            phone: "+254734567890".into(),
            specialties: strings(&["Solar Installation", "CCTV Setup", "Smart Home Systems"]),
            experience_years: 10,
            rating: 4.7,
            review_count: 203,
            avatar: Some("https://images.pexels.com/photos/1036627/pexels-photo-1036627.jpeg".into()),
            certifications: strings(&[
                "Solar PV Installer",
                "Security Systems Certified",
                "Smart Home Expert",
            ]),
            service_areas: vec![
                Location::Karen,
                Location::Lavington,
                Location::Westlands,
                Location::Kiambu,
            ],
            pricing: RatePair {
                base_rate: 3_000,
                on_site_rate: 5_000,
            },
        },
    ]
}

pub fn seed_services() -> Vec<Service> {
    vec![
        Service {
            id: service_id(1),
            name: "TV Repair & Diagnostics".into(),
            description: "Complete TV repair service for all brands - LCD, LED, OLED".into(),
            category: ServiceCategory::TvRepair,
            base_price: 2_500,
            on_site_price: 4_000,
            electrician_id: JOHN_MWANGI,
            electrician_name: "John Mwangi".into(),
            electrician_rating: 4.9,
            electrician_image: Some(
                "https://images.pexels.com/photos/1516680/pexels-photo-1516680.jpeg".into(),
            ),
            shop_address: DEFAULT_SHOP_ADDRESS.into(),
            duration: "2-3 hours".into(),
            availability: strings(&["Mon-Fri: 8AM-6PM", "Sat: 9AM-4PM"]),
        },
        Service {
            id: service_id(2),
            name: "Mobile Phone Screen Replacement".into(),
            description: "Professional screen replacement for all smartphone brands".into(),
            category: ServiceCategory::PhoneRepair,
            base_price: 2_000,
            on_site_price: 3_500,
            electrician_id: GRACE_WANJIKU,
            electrician_name: "Grace Wanjiku".into(),
            electrician_rating: 4.8,
            electrician_image: Some(
                "https://images.pexels.com/photos/1181690/pexels-photo-1181690.jpeg".into(),
            ),
            shop_address: DEFAULT_SHOP_ADDRESS.into(),
            duration: "1-2 hours".into(),
            availability: strings(&["Mon-Sat: 9AM-7PM", "Sun: 10AM-4PM"]),
        },
        Service {
            id: service_id(3),
            name: "Solar Panel Installation".into(),
            description: "Complete solar power system installation and maintenance".into(),
            category: ServiceCategory::Installation,
            base_price: 15_000,
            on_site_price: 15_000,
            electrician_id: DAVID_KIPKEMOI,
            electrician_name: "David Kipkemoi".into(),
            electrician_rating: 4.7,
            electrician_image: Some(
                "https://images.pexels.com/photos/1036627/pexels-photo-1036627.jpeg".into(),
            ),
            shop_address: DEFAULT_SHOP_ADDRESS.into(),
            duration: "1-2 days".into(),
            availability: strings(&["Mon-Fri: 7AM-5PM", "Sat: By appointment"]),
        },
    ]
}

/// Accounts owning the seed listings.
pub fn seed_identities() -> Vec<Identity> {
    let sellers = [
        (TECHHUB_KENYA, "TechHub Kenya", "sales@techhub.co.ke", Location::NairobiCbd),
        (NAIROBI_ELECTRONICS, "Nairobi Electronics", "hello@nairobielectronics.co.ke", Location::Westlands),
        (AUDIO_WORLD, "Audio World", "shop@audioworld.co.ke", Location::Kilimani),
    ];
    let mut identities: Vec<Identity> = sellers
        .into_iter()
        .map(|(id, name, email, location)| Identity {
            id,
            name: name.into(),
            email: email.into(),
            role: Role::Seller,
            phone: None,
            location: Some(location),
            verified: true,
            avatar: None,
            rating: None,
            review_count: None,
        })
        .collect();
    identities.extend(seed_electricians().into_iter().map(|e| Identity {
        id: e.id,
        name: e.name,
        email: e.email,
        role: Role::Electrician,
        phone: Some(e.phone),
        location: e.service_areas.first().copied(),
        verified: true,
        avatar: e.avatar,
        rating: Some(e.rating),
        review_count: Some(e.review_count),
    }));
    identities
}
