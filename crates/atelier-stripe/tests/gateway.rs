//! Integration tests for the checkout gateway against a mocked Stripe API.

use atelier_core::{Address, Cart, CartLine, CheckoutError, Currency, DeliverySelection, Price};
use atelier_stripe::{CheckoutGateway, RedirectUrls, StripeConfig};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn cart() -> Cart {
    let mut cart = Cart::new();
    cart.add_line(CartLine {
        item_id: "shanks".into(),
        name: "Shanks".into(),
        size_code: "A4".into(),
        unit_price: Price::new(7.80, Currency::EUR),
        quantity: 2,
        license_tag: None,
    });
    cart
}

fn address() -> Address {
    Address {
        first_name: "Ana".into(),
        last_name: "Martin".into(),
        email: "ana@example.com".into(),
        phone: None,
        street: "12 rue des Lilas".into(),
        city: "Lyon".into(),
        postal_code: "69003".into(),
        country_code: "FR".into(),
    }
}

fn france() -> DeliverySelection {
    DeliverySelection {
        region_label: "France".into(),
        base_price: Price::new(2.50, Currency::EUR),
        per_additional_item_price: Price::new(0.20, Currency::EUR),
    }
}

fn gateway_for(server: &MockServer) -> CheckoutGateway {
    let config = StripeConfig::new("sk_test_abc", "whsec_123").with_api_base_url(server.uri());
    CheckoutGateway::new(config).unwrap()
}

#[tokio::test]
async fn create_print_session_posts_form_and_returns_handle() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .and(header("Authorization", "Bearer sk_test_abc"))
        .and(body_string_contains("mode=payment"))
        .and(body_string_contains("metadata%5Bcategory%5D=print_shop"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "cs_test_abc123",
            "url": "https://checkout.stripe.com/c/pay/cs_test_abc123",
            "expires_at": 1_900_000_000i64
        })))
        .expect(1)
        .mount(&server)
        .await;

    let urls = RedirectUrls::new("https://atelier.example");
    let handle = gateway_for(&server)
        .create_print_session(&cart(), &address(), &france(), &urls)
        .await
        .unwrap();

    assert_eq!(handle.session_id, "cs_test_abc123");
    assert!(handle.checkout_url.contains("checkout.stripe.com"));
    assert!(handle.expires_at.is_some());
}

#[tokio::test]
async fn provider_rejection_surfaces_as_session_creation_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .respond_with(ResponseTemplate::new(402).set_body_json(serde_json::json!({
            "error": { "message": "Your card processing account is restricted." }
        })))
        .mount(&server)
        .await;

    let urls = RedirectUrls::new("https://atelier.example");
    let err = gateway_for(&server)
        .create_print_session(&cart(), &address(), &france(), &urls)
        .await
        .unwrap_err();

    match err {
        CheckoutError::SessionCreation(message) => {
            assert!(message.contains("restricted"));
        }
        other => panic!("expected SessionCreation, got {other:?}"),
    }
}

#[tokio::test]
async fn fetch_session_returns_confirmation_details() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/checkout/sessions/cs_test_abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "cs_test_abc123",
            "customer_email": "ana@example.com",
            "payment_status": "paid",
            "amount_total": 1830,
            "currency": "eur",
            "metadata": { "category": "print_shop" }
        })))
        .mount(&server)
        .await;

    let details = gateway_for(&server)
        .fetch_session("cs_test_abc123")
        .await
        .unwrap();

    assert_eq!(details.id, "cs_test_abc123");
    assert_eq!(details.payment_status.as_deref(), Some("paid"));
    assert_eq!(details.amount_total, Some(1830));
    assert_eq!(
        details.metadata.get("category").map(String::as_str),
        Some("print_shop")
    );
}
