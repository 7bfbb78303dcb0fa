//! Integration tests for placing orders and walking them through their
//! lifecycle, across commands, pricing and the status state machine.

use chrono::{Duration, TimeZone, Utc};
use domain::{
    Badge, Category, Color, LineItem, Material, Money, NewProduct, Order, OrderError, OrderStatus,
    PaymentMethod, PaymentStatus, PlaceOrder, PriceBreakdown, Product, ProductError, Review,
    ShippingAddress,
};

fn address() -> ShippingAddress {
    ShippingAddress {
        full_name: Some("Rohan Mehta".to_string()),
        phone: Some("9988776655".to_string()),
        street: "7 Hill Road".to_string(),
        city: "Mumbai".to_string(),
        state: "Maharashtra".to_string(),
        pincode: "400050".to_string(),
        country: "India".to_string(),
    }
}

fn product(stock: u32) -> Product {
    Product::create(NewProduct {
        name: "Heritage Duffel".to_string(),
        description: "Vegetable-tanned leather".to_string(),
        price: Money::from_major(100),
        old_price: Money::from_major(140),
        category: Category::Travel,
        material: Material::Leather,
        color: Color::Brown,
        badge: Badge::Luxury,
        images: vec!["duffel-front.jpg".to_string()],
        stock,
        featured: true,
    })
    .unwrap()
}

fn line_for(product: &Product, quantity: u32) -> LineItem {
    LineItem::new(product.id, product.name.clone(), product.price, quantity)
        .with_image(product.images[0].clone())
}

mod placement {
    use super::*;

    #[test]
    fn snapshot_survives_product_changes() {
        let mut duffel = product(5);
        let cmd = PlaceOrder::new(
            None,
            vec![line_for(&duffel, 2)],
            address(),
            PaymentMethod::new("card"),
        );
        let order = Order::place(cmd, true, Utc::now()).unwrap();

        duffel.name = "Renamed".to_string();
        duffel.price = Money::from_major(1);

        assert_eq!(order.items()[0].name, "Heritage Duffel");
        assert_eq!(order.items()[0].price, Money::from_major(100));
        assert_eq!(order.items()[0].image.as_deref(), Some("duffel-front.jpg"));
        assert_eq!(order.total_amount(), Money::from_major(200));
        assert_eq!(order.total_quantity(), 2);
    }

    #[test]
    fn full_breakdown_with_coupon_and_notes() {
        let duffel = product(5);
        let items = vec![line_for(&duffel, 3)];
        let pricing = PriceBreakdown::for_items(
            &items,
            Money::from_major(50),
            Money::from_major(54),
            Money::from_major(30),
        )
        .unwrap();
        let cmd = PlaceOrder::new(None, items, address(), PaymentMethod::new("upi"))
            .with_pricing(pricing)
            .with_coupon("FESTIVE30")
            .with_notes("Leave with the concierge");

        let order = Order::place(cmd, true, Utc::now()).unwrap();
        assert_eq!(order.pricing().subtotal, Money::from_major(300));
        assert_eq!(order.total_amount(), Money::from_major(374));
        assert_eq!(order.coupon_code(), Some("FESTIVE30"));
        assert_eq!(order.order_notes(), Some("Leave with the concierge"));
        assert_eq!(order.payment_status(), PaymentStatus::Completed);
    }

    #[test]
    fn unverified_totals_still_reject_negatives() {
        let duffel = product(5);
        let items = vec![line_for(&duffel, 1)];
        let trusted = PriceBreakdown {
            subtotal: Money::from_major(100),
            shipping_charges: Money::zero(),
            tax: Money::zero(),
            discount: Money::zero(),
            total_amount: Money::from_major(1),
        };

        let cmd = PlaceOrder::new(None, items.clone(), address(), PaymentMethod::new("card"))
            .with_pricing(trusted);
        assert!(matches!(
            Order::place(cmd.clone(), true, Utc::now()),
            Err(OrderError::TotalsMismatch {
                field: "total_amount",
                ..
            })
        ));
        assert_eq!(
            Order::place(cmd, false, Utc::now()).unwrap().total_amount(),
            Money::from_major(1)
        );

        let negative = PlaceOrder::new(None, items, address(), PaymentMethod::new("card"))
            .with_pricing(PriceBreakdown {
                discount: Money::from_cents(-1),
                ..trusted
            });
        assert_eq!(
            Order::place(negative, false, Utc::now()),
            Err(OrderError::NegativeAmount {
                field: "discount",
                cents: -1,
            })
        );
    }

    #[test]
    fn overflowing_amounts_are_rejected_with_or_without_verification() {
        let duffel = product(5);
        let mut huge = line_for(&duffel, 4);
        huge.price = Money::from_cents((1 << 62) + 1);
        let cmd = PlaceOrder::new(None, vec![huge], address(), "card".into()).with_pricing(
            PriceBreakdown {
                subtotal: Money::from_cents(4),
                total_amount: Money::from_cents(4),
                ..Default::default()
            },
        );

        for verify in [true, false] {
            assert_eq!(
                Order::place(cmd.clone(), verify, Utc::now()),
                Err(OrderError::AmountOverflow { field: "line_total" })
            );
        }
    }

    #[test]
    fn incomplete_commands_are_rejected() {
        let duffel = product(5);

        let mut blank_city = address();
        blank_city.city = "  ".to_string();
        let cmd = PlaceOrder::new(None, vec![line_for(&duffel, 1)], blank_city, "card".into());
        assert_eq!(
            Order::place(cmd, true, Utc::now()),
            Err(OrderError::InvalidShippingAddress { field: "city" })
        );

        let cmd = PlaceOrder::new(None, vec![line_for(&duffel, 1)], address(), "".into());
        assert_eq!(
            Order::place(cmd, true, Utc::now()),
            Err(OrderError::MissingPaymentMethod)
        );

        let zero = PlaceOrder::new(None, vec![line_for(&duffel, 0)], address(), "card".into());
        assert!(matches!(
            Order::place(zero, true, Utc::now()),
            Err(OrderError::InvalidQuantity { quantity: 0, .. })
        ));
    }

    #[test]
    fn order_number_carries_placement_date() {
        let duffel = product(5);
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 18, 30, 0).unwrap();
        let cmd = PlaceOrder::new(None, vec![line_for(&duffel, 1)], address(), "cod".into());
        let order = Order::place(cmd, true, at).unwrap();

        assert!(order.order_number().as_str().starts_with("ORD-20240309-"));
        assert_eq!(order.created_at(), at);
        assert_eq!(order.payment_status(), PaymentStatus::Pending);
    }
}

mod lifecycle {
    use super::*;

    fn placed_cod() -> Order {
        let cmd = PlaceOrder::new(
            None,
            vec![line_for(&product(5), 1)],
            address(),
            PaymentMethod::cash_on_delivery(),
        );
        Order::place(cmd, true, Utc::now()).unwrap()
    }

    #[test]
    fn ship_then_deliver() {
        let mut order = placed_cod();
        let now = Utc::now();

        assert!(order.transition_to(OrderStatus::Processing, now).unwrap());
        assert!(order.transition_to(OrderStatus::Shipped, now).unwrap());
        order.attach_tracking("AWB-55102", now).unwrap();
        assert_eq!(order.payment_status(), PaymentStatus::Pending);

        let delivered_at = now + Duration::days(2);
        assert!(order.transition_to(OrderStatus::Delivered, delivered_at).unwrap());
        assert_eq!(order.delivered_at(), Some(delivered_at));
        assert_eq!(order.payment_status(), PaymentStatus::Completed);
        assert_eq!(order.tracking_number(), Some("AWB-55102"));
    }

    #[test]
    fn delivered_order_can_still_be_cancelled() {
        let mut order = placed_cod();
        let now = Utc::now();
        order.transition_to(OrderStatus::Delivered, now).unwrap();

        assert!(order.transition_to(OrderStatus::Cancelled, now).unwrap());
        assert!(order.is_cancelled());
        assert!(!order.transition_to(OrderStatus::Cancelled, now).unwrap());
        assert_eq!(
            order.transition_to(OrderStatus::Placed, now),
            Err(OrderError::InvalidStateTransition {
                from: OrderStatus::Cancelled,
                to: OrderStatus::Placed,
            })
        );
    }

    #[test]
    fn empty_tracking_number_is_rejected() {
        let mut order = placed_cod();
        assert_eq!(
            order.attach_tracking(" ", Utc::now()),
            Err(OrderError::EmptyTrackingNumber)
        );
        assert_eq!(order.tracking_number(), None);
    }
}

mod catalog {
    use super::*;

    #[test]
    fn stock_never_goes_negative() {
        let mut duffel = product(3);
        assert_eq!(duffel.reserve(2).unwrap(), 1);
        assert_eq!(
            duffel.reserve(2),
            Err(ProductError::InsufficientStock {
                requested: 2,
                available: 1,
            })
        );
        assert_eq!(duffel.stock(), 1);
        assert_eq!(duffel.release(2).unwrap(), 3);
    }

    #[test]
    fn rating_follows_reviews() {
        let mut duffel = product(1);
        assert_eq!(duffel.rating(), 0.0);
        assert_eq!(duffel.total_reviews(), 0);

        duffel.add_review(Review::new(4, "Roomy", "Ishaan").unwrap());
        assert_eq!(duffel.rating(), 4.0);
        assert_eq!(duffel.total_reviews(), 1);

        duffel.add_review(Review::new(1, "Strap broke", "Tara").unwrap());
        assert_eq!(duffel.rating(), 2.5);
        assert_eq!(duffel.total_reviews(), 2);
    }
}
