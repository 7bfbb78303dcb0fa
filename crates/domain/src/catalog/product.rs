//! Product entity and its review collection.

use chrono::{DateTime, Utc};
use common::{ProductId, UserId};
use serde::{Deserialize, Serialize};

use super::{Badge, Category, Color, Material, ProductError};
use crate::money::Money;

/// Lowest rating a reviewer may give.
pub const MIN_RATING: u8 = 1;
/// Highest rating a reviewer may give.
pub const MAX_RATING: u8 = 5;

/// A single customer review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    /// Reviewer account, if the review was left while signed in.
    pub user_id: Option<UserId>,
    /// Display name of the reviewer.
    pub reviewer_name: String,
    /// Star rating in `1..=5`.
    pub rating: u8,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl Review {
    /// Creates a review, rejecting ratings outside `1..=5`.
    pub fn new(
        rating: u8,
        comment: impl Into<String>,
        reviewer_name: impl Into<String>,
    ) -> Result<Self, ProductError> {
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(ProductError::InvalidRating { rating });
        }
        Ok(Self {
            user_id: None,
            reviewer_name: reviewer_name.into(),
            rating,
            comment: comment.into(),
            created_at: Utc::now(),
        })
    }

    /// True if the rating is within `1..=5`.
    pub fn has_valid_rating(&self) -> bool {
        (MIN_RATING..=MAX_RATING).contains(&self.rating)
    }

    /// Attributes the review to a signed-in user.
    pub fn by_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }
}

/// Input for creating a product through the admin surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Money,
    #[serde(default)]
    pub old_price: Money,
    pub category: Category,
    pub material: Material,
    pub color: Color,
    #[serde(default)]
    pub badge: Badge,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub featured: bool,
}

/// Partial update of a product's descriptive fields.
///
/// Stock and reviews are deliberately absent; they change only through
/// their own operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub old_price: Option<Money>,
    pub category: Option<Category>,
    pub material: Option<Material>,
    pub color: Option<Color>,
    pub badge: Option<Badge>,
    pub images: Option<Vec<String>>,
    pub featured: Option<bool>,
}

/// A catalog product.
///
/// `rating` and `total_reviews` are derived from `reviews` and recomputed on
/// every append; they are never set directly. Deserialization goes through
/// [`ProductRecord`] so a stored product can never carry a stale rating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ProductRecord")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub old_price: Money,
    pub category: Category,
    pub material: Material,
    pub color: Color,
    pub badge: Badge,
    pub images: Vec<String>,
    stock: u32,
    reviews: Vec<Review>,
    rating: f64,
    total_reviews: u32,
    pub featured: bool,
    is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Stored shape of a product, without the derived rating fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub old_price: Money,
    pub category: Category,
    pub material: Material,
    pub color: Color,
    pub badge: Badge,
    pub images: Vec<String>,
    pub stock: u32,
    pub reviews: Vec<Review>,
    pub featured: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Reviews with an out-of-range rating are dropped.
impl From<ProductRecord> for Product {
    fn from(record: ProductRecord) -> Self {
        let reviews = record
            .reviews
            .into_iter()
            .filter(Review::has_valid_rating)
            .collect();
        let mut product = Product {
            id: record.id,
            name: record.name,
            description: record.description,
            price: record.price,
            old_price: record.old_price,
            category: record.category,
            material: record.material,
            color: record.color,
            badge: record.badge,
            images: record.images,
            stock: record.stock,
            reviews,
            rating: 0.0,
            total_reviews: 0,
            featured: record.featured,
            is_active: record.is_active,
            created_at: record.created_at,
            updated_at: record.updated_at,
        };
        product.recalculate_rating();
        product
    }
}

impl Product {
    /// Creates an active product from admin input.
    pub fn create(input: NewProduct) -> Result<Self, ProductError> {
        if input.name.trim().is_empty() {
            return Err(ProductError::MissingField { field: "name" });
        }
        if input.description.trim().is_empty() {
            return Err(ProductError::MissingField {
                field: "description",
            });
        }
        check_price("price", input.price)?;
        check_price("old_price", input.old_price)?;

        let now = Utc::now();
        Ok(Self {
            id: ProductId::new(),
            name: input.name.trim().to_string(),
            description: input.description,
            price: input.price,
            old_price: input.old_price,
            category: input.category,
            material: input.material,
            color: input.color,
            badge: input.badge,
            images: input.images,
            stock: input.stock,
            reviews: Vec::new(),
            rating: 0.0,
            total_reviews: 0,
            featured: input.featured,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn stock(&self) -> u32 {
        self.stock
    }

    pub fn reviews(&self) -> &[Review] {
        &self.reviews
    }

    /// Mean of all review ratings, 0 when there are none.
    pub fn rating(&self) -> f64 {
        self.rating
    }

    pub fn total_reviews(&self) -> u32 {
        self.total_reviews
    }

    /// False once the product has been soft deleted.
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Converts back into the stored shape.
    pub fn into_record(self) -> ProductRecord {
        ProductRecord {
            id: self.id,
            name: self.name,
            description: self.description,
            price: self.price,
            old_price: self.old_price,
            category: self.category,
            material: self.material,
            color: self.color,
            badge: self.badge,
            images: self.images,
            stock: self.stock,
            reviews: self.reviews,
            featured: self.featured,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Takes `quantity` units out of stock.
    ///
    /// Fails without touching stock when fewer than `quantity` units remain.
    /// Returns the remaining stock.
    pub fn reserve(&mut self, quantity: u32) -> Result<u32, ProductError> {
        if self.stock < quantity {
            return Err(ProductError::InsufficientStock {
                requested: quantity,
                available: self.stock,
            });
        }
        self.stock -= quantity;
        self.touch();
        Ok(self.stock)
    }

    /// Puts `quantity` units back into stock. Returns the new stock.
    pub fn release(&mut self, quantity: u32) -> Result<u32, ProductError> {
        self.stock = self
            .stock
            .checked_add(quantity)
            .ok_or(ProductError::StockOverflow {
                current: self.stock,
                added: quantity,
            })?;
        self.touch();
        Ok(self.stock)
    }

    /// Overwrites the stock level (admin correction).
    pub fn set_stock(&mut self, stock: u32) {
        self.stock = stock;
        self.touch();
    }

    /// Appends a review and recomputes the derived rating fields.
    pub fn add_review(&mut self, review: Review) {
        self.reviews.push(review);
        self.recalculate_rating();
        self.touch();
    }

    /// Soft deletes the product: it stays loadable by id but leaves listings.
    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.touch();
    }

    /// Applies the present fields of `patch`.
    pub fn apply_patch(&mut self, patch: ProductPatch) -> Result<(), ProductError> {
        if let Some(ref name) = patch.name
            && name.trim().is_empty()
        {
            return Err(ProductError::MissingField { field: "name" });
        }
        if let Some(ref description) = patch.description
            && description.trim().is_empty()
        {
            return Err(ProductError::MissingField {
                field: "description",
            });
        }
        if let Some(price) = patch.price {
            check_price("price", price)?;
        }
        if let Some(old_price) = patch.old_price {
            check_price("old_price", old_price)?;
        }

        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(old_price) = patch.old_price {
            self.old_price = old_price;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(material) = patch.material {
            self.material = material;
        }
        if let Some(color) = patch.color {
            self.color = color;
        }
        if let Some(badge) = patch.badge {
            self.badge = badge;
        }
        if let Some(images) = patch.images {
            self.images = images;
        }
        if let Some(featured) = patch.featured {
            self.featured = featured;
        }
        self.touch();
        Ok(())
    }

    fn recalculate_rating(&mut self) {
        if self.reviews.is_empty() {
            self.rating = 0.0;
            self.total_reviews = 0;
        } else {
            let sum: u32 = self.reviews.iter().map(|r| u32::from(r.rating)).sum();
            self.total_reviews = self.reviews.len() as u32;
            self.rating = f64::from(sum) / f64::from(self.total_reviews);
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

fn check_price(field: &'static str, price: Money) -> Result<(), ProductError> {
    if price.is_negative() {
        return Err(ProductError::NegativePrice {
            field,
            cents: price.cents(),
        });
    }
    Ok(())
}
