//! Demo catalog data for local development.
//!
//! Rows are matched on slug, so running `seed` twice does not duplicate
//! anything. Carousel slides are only created when the carousel is empty.

use std::collections::HashMap;
use std::str::FromStr;

use rust_decimal::Decimal;

use apothecary_core::Slug;

use apothecary_storefront::db::{CarouselStore, CategoryStore, PgStore, ProductStore};
use apothecary_storefront::models::{CategoryInput, ProductInput, SlideInput};

use super::{CommandError, connect};

struct SeedCategory {
    name: &'static str,
    description: &'static str,
}

struct SeedProduct {
    category: &'static str,
    name: &'static str,
    description: &'static str,
    price: &'static str,
    sale_price: Option<&'static str>,
    stock: i32,
    featured: bool,
    prescription: bool,
}

const CATEGORIES: &[SeedCategory] = &[
    SeedCategory {
        name: "Cold & Flu",
        description: "Relief for coughs, colds and sore throats.",
    },
    SeedCategory {
        name: "Allergies",
        description: "Antihistamines and nasal sprays for hay fever season.",
    },
    SeedCategory {
        name: "Vitamins & Supplements",
        description: "Everyday vitamins, minerals and supplements.",
    },
    SeedCategory {
        name: "Skin Care",
        description: "Moisturisers, sun protection and treatments.",
    },
    SeedCategory {
        name: "Pain Relief",
        description: "Tablets, gels and patches for aches and pains.",
    },
];

const PRODUCTS: &[SeedProduct] = &[
    SeedProduct {
        category: "Cold & Flu",
        name: "Honey & Lemon Throat Lozenges",
        description: "Soothing lozenges for sore throats. Pack of 24.",
        price: "4.49",
        sale_price: None,
        stock: 120,
        featured: true,
        prescription: false,
    },
    SeedProduct {
        category: "Cold & Flu",
        name: "Chesty Cough Syrup 150ml",
        description: "Loosens mucus to relieve chesty coughs. Not for children under 12.",
        price: "7.99",
        sale_price: Some("6.49"),
        stock: 45,
        featured: false,
        prescription: false,
    },
    SeedProduct {
        category: "Allergies",
        name: "Cetirizine 10mg",
        description: "One-a-day non-drowsy antihistamine. 30 tablets.",
        price: "3.99",
        sale_price: None,
        stock: 200,
        featured: true,
        prescription: false,
    },
    SeedProduct {
        category: "Allergies",
        name: "Beclometasone Nasal Spray",
        description: "Steroid nasal spray for hay fever. Start before the pollen season.",
        price: "8.75",
        sale_price: None,
        stock: 30,
        featured: false,
        prescription: false,
    },
    SeedProduct {
        category: "Vitamins & Supplements",
        name: "Vitamin D3 1000IU",
        description: "Supports bones and immunity through the darker months. 90 tablets.",
        price: "9.99",
        sale_price: Some("7.99"),
        stock: 80,
        featured: true,
        prescription: false,
    },
    SeedProduct {
        category: "Vitamins & Supplements",
        name: "Zinc & Vitamin C Effervescent",
        description: "Orange flavour effervescent tablets. Tube of 20.",
        price: "5.25",
        sale_price: None,
        stock: 0,
        featured: false,
        prescription: false,
    },
    SeedProduct {
        category: "Skin Care",
        name: "SPF 50 Sun Cream 200ml",
        description: "High protection with a five star UVA rating. Water resistant.",
        price: "12.50",
        sale_price: None,
        stock: 60,
        featured: true,
        prescription: false,
    },
    SeedProduct {
        category: "Skin Care",
        name: "Emollient Cream 500g",
        description: "Fragrance-free moisturiser for dry and eczema-prone skin.",
        price: "6.99",
        sale_price: None,
        stock: 75,
        featured: false,
        prescription: false,
    },
    SeedProduct {
        category: "Pain Relief",
        name: "Ibuprofen Gel 5%",
        description: "Topical relief for muscular aches and sprains. 100g tube.",
        price: "5.49",
        sale_price: None,
        stock: 90,
        featured: false,
        prescription: false,
    },
    SeedProduct {
        category: "Pain Relief",
        name: "Naproxen 250mg",
        description: "Prescription anti-inflammatory. A pharmacist will check your prescription before dispatch.",
        price: "11.00",
        sale_price: None,
        stock: 25,
        featured: false,
        prescription: true,
    },
];

/// Load demo categories, products and carousel slides.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a write fails.
pub async fn run() -> Result<(), CommandError> {
    let store = PgStore::new(connect().await?);

    let mut category_ids = HashMap::new();
    for seed in CATEGORIES {
        let slug = slug_for(seed.name);
        let category = match store.get_category_by_slug(&slug).await? {
            Some(existing) => existing,
            None => {
                let created = store.create_category(&category_input(seed)).await?;
                tracing::info!(slug = %created.slug, "Created category");
                created
            }
        };
        category_ids.insert(seed.name, category.id);
    }

    let mut created = 0;
    for seed in PRODUCTS {
        if store.get_product_by_slug(&slug_for(seed.name)).await?.is_some() {
            continue;
        }
        let mut input = product_input(seed);
        input.category_id = category_ids.get(seed.category).copied();
        let product = store.create_product(&input).await?;
        tracing::info!(slug = %product.slug, "Created product");
        created += 1;
    }
    tracing::info!(created, total = PRODUCTS.len(), "Products seeded");

    if store.list_slides().await?.is_empty() {
        for input in slides() {
            store.create_slide(&input).await?;
        }
        tracing::info!("Carousel slides seeded");
    } else {
        tracing::info!("Carousel already has slides, skipping");
    }

    Ok(())
}

/// The slug the store derives for `name`.
fn slug_for(name: &str) -> String {
    Slug::from_title(name).map(|slug| slug.to_string()).unwrap_or_default()
}

fn category_input(seed: &SeedCategory) -> CategoryInput {
    CategoryInput {
        name: seed.name.to_string(),
        description: Some(seed.description.to_string()),
        image_url: None,
    }
}

fn price(raw: &str) -> Decimal {
    Decimal::from_str(raw).unwrap_or_default()
}

fn product_input(seed: &SeedProduct) -> ProductInput {
    let slug = slug_for(seed.name);
    ProductInput {
        category_id: None,
        name: seed.name.to_string(),
        description: seed.description.to_string(),
        price: price(seed.price),
        sale_price: seed.sale_price.map(price),
        image_url: None,
        stock: seed.stock,
        is_featured: seed.featured,
        requires_prescription: seed.prescription,
        payment_link: Some(format!("https://pay.example.com/apothecary/{slug}")),
    }
}

fn slides() -> Vec<SlideInput> {
    vec![
        SlideInput {
            title: "Flu vaccinations now available".to_string(),
            subtitle: Some("Book a free jab with one of our pharmacists.".to_string()),
            image_url: "https://images.unsplash.com/photo-1584036561566-baf8f5f1b144".to_string(),
            link_url: Some("/profile/appointments".to_string()),
            button_text: Some("Book now".to_string()),
            is_active: true,
        },
        SlideInput {
            title: "Beat hay fever".to_string(),
            subtitle: Some("Antihistamines and nasal sprays in stock.".to_string()),
            image_url: "https://images.unsplash.com/photo-1490750967868-88aa4486c946".to_string(),
            link_url: Some("/shop?category=allergies".to_string()),
            button_text: Some("Shop allergies".to_string()),
            is_active: true,
        },
        SlideInput {
            title: "Vitamin D for the winter months".to_string(),
            subtitle: None,
            image_url: "https://images.unsplash.com/photo-1550572017-edd951b55104".to_string(),
            link_url: Some("/products/vitamin-d3-1000iu".to_string()),
            button_text: Some("Shop vitamin D".to_string()),
            is_active: false,
        },
    ]
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_seed_products_are_valid() {
        for seed in PRODUCTS {
            let input = product_input(seed);
            assert_eq!(input.validation_error(), None, "{}", seed.name);
            assert!(input.price > Decimal::ZERO, "{}", seed.name);
            assert!(
                input.sale_price.is_none_or(|sale| sale < input.price),
                "{}",
                seed.name
            );
        }
    }

    #[test]
    fn test_seed_products_reference_known_categories() {
        let names: HashSet<&str> = CATEGORIES.iter().map(|c| c.name).collect();
        for seed in PRODUCTS {
            assert!(names.contains(seed.category), "{}", seed.category);
        }
    }

    #[test]
    fn test_seed_slugs_are_unique() {
        let slugs: HashSet<String> = PRODUCTS.iter().map(|p| slug_for(p.name)).collect();
        assert_eq!(slugs.len(), PRODUCTS.len());
        assert!(slugs.contains("vitamin-d3-1000iu"));
        assert!(slugs.contains("cetirizine-10mg"));
    }
}
