//! Code templates emitted by the repair engine.
//!
//! Shopify gets Liquid that reads store data from template objects. Every
//! other platform gets generic JavaScript, wrapped in a `<script>` element
//! unless the requested output format is bare `js`.

use serde_json::json;

use crate::domain::models::{
    CodeSnippet, EcommerceSignal, OutputFormat, RepairConfig, RepairPlatform, SnippetLanguage,
};

/// Placeholder container ID written into generated code.
pub const TAG_MANAGER_PLACEHOLDER: &str = "GTM-XXXXXXX";

/// Placeholder GA4 measurement ID written into generated code.
pub const ANALYTICS_PLACEHOLDER: &str = "G-XXXXXXXXXX";

/// Snippets plus where and when they apply.
#[derive(Debug, Clone)]
pub struct Template {
    pub snippets: Vec<CodeSnippet>,
    pub install_location: String,
    pub trigger_condition: Option<String>,
    pub testing_steps: Vec<String>,
}

fn snippet(label: &str, language: SnippetLanguage, code: impl Into<String>) -> CodeSnippet {
    CodeSnippet {
        label: label.to_string(),
        language,
        code: code.into(),
    }
}

/// Generic JavaScript in the requested wrapping.
fn generic_script(label: &str, body: &str, config: &RepairConfig) -> CodeSnippet {
    match config.output_format {
        OutputFormat::Js => snippet(label, SnippetLanguage::Javascript, body.trim()),
        OutputFormat::Liquid | OutputFormat::Html => snippet(
            label,
            SnippetLanguage::Html,
            format!("<script>\n{}\n</script>", body.trim()),
        ),
    }
}

fn steps(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

pub fn tag_manager_install(config: &RepairConfig) -> Template {
    let id = TAG_MANAGER_PLACEHOLDER;
    let mut snippets = vec![
        snippet(
            "head",
            SnippetLanguage::Html,
            format!(
                "<!-- Google Tag Manager -->
<script>(function(w,d,s,l,i){{w[l]=w[l]||[];w[l].push({{'gtm.start':
new Date().getTime(),event:'gtm.js'}});var f=d.getElementsByTagName(s)[0],
j=d.createElement(s),dl=l!='dataLayer'?'&l='+l:'';j.async=true;j.src=
'https://www.googletagmanager.com/gtm.js?id='+i+dl;f.parentNode.insertBefore(j,f);
}})(window,document,'script','dataLayer','{id}');</script>
<!-- End Google Tag Manager -->"
            ),
        ),
        snippet(
            "body",
            SnippetLanguage::Html,
            format!(
                "<!-- Google Tag Manager (noscript) -->
<noscript><iframe src=\"https://www.googletagmanager.com/ns.html?id={id}\"
height=\"0\" width=\"0\" style=\"display:none;visibility:hidden\"></iframe></noscript>
<!-- End Google Tag Manager (noscript) -->"
            ),
        ),
    ];
    if config.platform == RepairPlatform::Shopify {
        snippets.push(snippet(
            "liquid",
            SnippetLanguage::Liquid,
            "{%- comment -%} Google Tag Manager - Add to theme.liquid {%- endcomment -%}
{% unless settings.gtm_container_id == blank %}
<script>
(function(w,d,s,l,i){w[l]=w[l]||[];w[l].push({'gtm.start':
new Date().getTime(),event:'gtm.js'});var f=d.getElementsByTagName(s)[0],
j=d.createElement(s),dl=l!='dataLayer'?'&l='+l:'';j.async=true;j.src=
'https://www.googletagmanager.com/gtm.js?id='+i+dl;f.parentNode.insertBefore(j,f);
})(window,document,'script','dataLayer','{{ settings.gtm_container_id }}');
</script>
{% endunless %}",
        ));
    }

    Template {
        snippets,
        install_location: match config.platform {
            RepairPlatform::Shopify => "Add to <head> section of theme.liquid".to_string(),
            _ => "Add to the <head> and opening <body> of every page".to_string(),
        },
        trigger_condition: None,
        testing_steps: steps(&[
            "Install code in the site template",
            "Open GTM in preview mode",
            "Navigate to your site",
            "Verify container loads in preview",
            "Publish GTM container when confirmed working",
        ]),
    }
}

fn gtag_snippet(id: &str) -> CodeSnippet {
    snippet(
        "gtag",
        SnippetLanguage::Html,
        format!(
            "<!-- Google Analytics 4 -->
<script async src=\"https://www.googletagmanager.com/gtag/js?id={id}\"></script>
<script>
  window.dataLayer = window.dataLayer || [];
  function gtag(){{dataLayer.push(arguments);}}
  gtag('js', new Date());
  gtag('config', '{id}');
</script>
<!-- End Google Analytics 4 -->"
        ),
    )
}

pub fn analytics_install() -> Template {
    let id = ANALYTICS_PLACEHOLDER;
    let tag_config = json!({
        "tagName": "GA4 Configuration",
        "tagType": "Google Analytics: GA4 Configuration",
        "measurementID": id,
        "triggers": ["All Pages"],
        "settings": {
            "enhanced_measurement": true,
            "page_view": true,
            "scroll_tracking": true,
            "outbound_clicks": true,
            "site_search": true,
            "video_engagement": true,
            "file_downloads": true
        }
    });
    let tag_config = serde_json::to_string_pretty(&tag_config).unwrap_or_default();

    Template {
        snippets: vec![
            gtag_snippet(id),
            snippet("gtmConfiguration", SnippetLanguage::Json, tag_config),
        ],
        install_location: "Add via GTM or directly to <head>".to_string(),
        trigger_condition: None,
        testing_steps: steps(&[
            "Install GA4 configuration",
            "Open GA4 DebugView",
            "Navigate to your site",
            "Verify page_view events appear",
            "Check Real-time reports show traffic",
        ]),
    }
}

pub fn legacy_migration(config: &RepairConfig) -> Template {
    let removal = generic_script(
        "removeUniversalAnalytics",
        "// Remove every snippet that loads analytics.js or configures a UA-XXXXX-Y ID,
// including ga('create', ...) and ga('send', 'pageview') calls.
// Universal Analytics no longer processes data; GA4 replaces it below.",
        config,
    );
    Template {
        snippets: vec![removal, gtag_snippet(ANALYTICS_PLACEHOLDER)],
        install_location: match config.platform {
            RepairPlatform::Shopify => {
                "theme.liquid and Online Store > Preferences (clear the legacy Google Analytics field)"
                    .to_string()
            }
            _ => "Site-wide <head> template".to_string(),
        },
        trigger_condition: None,
        testing_steps: steps(&[
            "Confirm no requests to google-analytics.com/analytics.js remain",
            "Open GA4 DebugView",
            "Verify page_view events arrive on the GA4 property",
        ]),
    }
}

fn liquid_event(signal: EcommerceSignal) -> (&'static str, &'static str, &'static str) {
    match signal {
        EcommerceSignal::ViewItem => (
            "{%- comment -%} Product View Tracking {%- endcomment -%}
{% if template contains 'product' %}
<script>
window.dataLayer = window.dataLayer || [];
dataLayer.push({
  'event': 'view_item',
  'ecommerce': {
    'currency': '{{ cart.currency.iso_code }}',
    'value': {{ product.price | money_without_currency | remove: ',' }},
    'items': [{
      'item_id': '{{ product.id }}',
      'item_name': {{ product.title | json }},
      'item_category': '{{ product.type }}',
      'item_variant': '{{ product.selected_or_first_available_variant.title }}',
      'price': {{ product.selected_or_first_available_variant.price | money_without_currency | remove: ',' }},
      'quantity': 1
    }]
  }
});
</script>
{% endif %}",
            "Add to product.liquid template",
            "When product page loads",
        ),
        EcommerceSignal::AddToCart => (
            "{%- comment -%} Add to Cart Tracking {%- endcomment -%}
<script>
document.addEventListener('DOMContentLoaded', function() {
  var form = document.querySelector('form[action*=\"/cart/add\"]');
  if (!form) return;
  form.addEventListener('submit', function(e) {
    var formData = new FormData(e.target);
    var variantId = formData.get('id');
    var quantity = parseInt(formData.get('quantity') || 1, 10);
    fetch('/products/{{ product.handle }}.js')
      .then(function(response) { return response.json(); })
      .then(function(product) {
        var variant = product.variants.find(function(v) { return v.id == variantId; });
        window.dataLayer = window.dataLayer || [];
        dataLayer.push({
          'event': 'add_to_cart',
          'ecommerce': {
            'currency': '{{ cart.currency.iso_code }}',
            'value': (variant.price / 100) * quantity,
            'items': [{
              'item_id': variant.id,
              'item_name': product.title,
              'item_category': product.product_type,
              'item_variant': variant.title,
              'price': variant.price / 100,
              'quantity': quantity
            }]
          }
        });
      });
  });
});
</script>",
            "Add to product.liquid template",
            "When add to cart form is submitted",
        ),
        EcommerceSignal::ViewCart => (
            "{%- comment -%} Cart View Tracking {%- endcomment -%}
{% if template == 'cart' %}
<script>
window.dataLayer = window.dataLayer || [];
dataLayer.push({
  'event': 'view_cart',
  'ecommerce': {
    'currency': '{{ cart.currency.iso_code }}',
    'value': {{ cart.total_price | money_without_currency | remove: ',' }},
    'items': [
      {% for item in cart.items %}
      {
        'item_id': '{{ item.variant.id }}',
        'item_name': {{ item.product.title | json }},
        'item_category': '{{ item.product.type }}',
        'item_variant': '{{ item.variant.title }}',
        'price': {{ item.price | money_without_currency | remove: ',' }},
        'quantity': {{ item.quantity }}
      }{% unless forloop.last %},{% endunless %}
      {% endfor %}
    ]
  }
});
</script>
{% endif %}",
            "Add to cart.liquid template",
            "When cart page loads",
        ),
        EcommerceSignal::BeginCheckout => (
            "{%- comment -%} Checkout Begin Tracking {%- endcomment -%}
{% if first_time_accessed %}
<script>
window.dataLayer = window.dataLayer || [];
dataLayer.push({
  'event': 'begin_checkout',
  'ecommerce': {
    'currency': '{{ checkout.currency }}',
    'value': {{ checkout.total_price | money_without_currency | remove: ',' }},
    'items': [
      {% for line_item in checkout.line_items %}
      {
        'item_id': '{{ line_item.variant.id }}',
        'item_name': {{ line_item.title | json }},
        'item_category': '{{ line_item.product.type }}',
        'item_variant': '{{ line_item.variant.title }}',
        'price': {{ line_item.price | money_without_currency | remove: ',' }},
        'quantity': {{ line_item.quantity }}
      }{% unless forloop.last %},{% endunless %}
      {% endfor %}
    ]
  }
});
</script>
{% endif %}",
            "Add to checkout.liquid template",
            "When checkout process begins",
        ),
        EcommerceSignal::Purchase => (
            "{%- comment -%} Purchase Tracking {%- endcomment -%}
{% if first_time_accessed %}
<script>
window.dataLayer = window.dataLayer || [];
dataLayer.push({
  'event': 'purchase',
  'ecommerce': {
    'transaction_id': '{{ order.order_number }}',
    'currency': '{{ order.currency }}',
    'value': {{ order.total_price | money_without_currency | remove: ',' }},
    'shipping': {{ order.shipping_price | money_without_currency | remove: ',' }},
    'tax': {{ order.tax_price | money_without_currency | remove: ',' }},
    'items': [
      {% for line_item in order.line_items %}
      {
        'item_id': '{{ line_item.variant.id }}',
        'item_name': {{ line_item.title | json }},
        'item_category': '{{ line_item.product.type }}',
        'item_variant': '{{ line_item.variant.title }}',
        'price': {{ line_item.price | money_without_currency | remove: ',' }},
        'quantity': {{ line_item.quantity }}
      }{% unless forloop.last %},{% endunless %}
      {% endfor %}
    ]
  }
});
</script>
{% endif %}",
            "Add to order status page additional scripts",
            "When purchase is completed",
        ),
    }
}

fn generic_event(signal: EcommerceSignal) -> (&'static str, &'static str) {
    match signal {
        EcommerceSignal::ViewItem => (
            "// Product View Tracking
function trackProductView(product) {
  window.dataLayer = window.dataLayer || [];
  dataLayer.push({
    'event': 'view_item',
    'ecommerce': {
      'currency': 'USD',
      'value': product.price,
      'items': [{
        'item_id': product.id,
        'item_name': product.name,
        'item_category': product.category,
        'price': product.price,
        'quantity': 1
      }]
    }
  });
}

// Call on product page load
if (typeof productData !== 'undefined') {
  trackProductView(productData);
}",
            "Add to product page template",
        ),
        EcommerceSignal::AddToCart => (
            "// Add to Cart Tracking
function trackAddToCart(item) {
  window.dataLayer = window.dataLayer || [];
  dataLayer.push({
    'event': 'add_to_cart',
    'ecommerce': {
      'currency': 'USD',
      'value': item.price * item.quantity,
      'items': [{
        'item_id': item.id,
        'item_name': item.name,
        'item_category': item.category,
        'price': item.price,
        'quantity': item.quantity
      }]
    }
  });
}

// Attach to add to cart buttons
document.querySelectorAll('.add-to-cart').forEach(function(button) {
  button.addEventListener('click', function() {
    // Extract product data and call trackAddToCart(productData)
  });
});",
            "Add to product page or global script",
        ),
        EcommerceSignal::ViewCart => (
            "// Cart View Tracking
function trackViewCart(cartItems) {
  var totalValue = cartItems.reduce(function(sum, item) { return sum + item.price * item.quantity; }, 0);
  window.dataLayer = window.dataLayer || [];
  dataLayer.push({
    'event': 'view_cart',
    'ecommerce': {
      'currency': 'USD',
      'value': totalValue,
      'items': cartItems
    }
  });
}

// Call on cart page load
if (window.location.pathname.indexOf('/cart') !== -1) {
  // Extract cart data and call trackViewCart(cartData)
}",
            "Add to cart page template",
        ),
        EcommerceSignal::BeginCheckout => (
            "// Begin Checkout Tracking
function trackBeginCheckout(cartItems) {
  var totalValue = cartItems.reduce(function(sum, item) { return sum + item.price * item.quantity; }, 0);
  window.dataLayer = window.dataLayer || [];
  dataLayer.push({
    'event': 'begin_checkout',
    'ecommerce': {
      'currency': 'USD',
      'value': totalValue,
      'items': cartItems
    }
  });
}

// Call when checkout process starts
var checkoutButton = document.querySelector('.checkout-button');
if (checkoutButton) {
  checkoutButton.addEventListener('click', function() {
    // Extract cart data and call trackBeginCheckout(cartData)
  });
}",
            "Add to checkout initiation",
        ),
        EcommerceSignal::Purchase => (
            "// Purchase Tracking
function trackPurchase(orderData) {
  window.dataLayer = window.dataLayer || [];
  dataLayer.push({
    'event': 'purchase',
    'ecommerce': {
      'transaction_id': orderData.id,
      'currency': 'USD',
      'value': orderData.total,
      'shipping': orderData.shipping,
      'tax': orderData.tax,
      'items': orderData.items
    }
  });
}

// Call on order confirmation page
if (window.location.pathname.indexOf('/order-complete') !== -1) {
  // Extract order data and call trackPurchase(orderData)
}",
            "Add to order confirmation page",
        ),
    }
}

pub fn ecommerce_event(signal: EcommerceSignal, config: &RepairConfig) -> Template {
    let event = signal.event_name();
    let testing_steps = vec![
        "Open GTM Preview mode".to_string(),
        format!("Perform the {event} action on the site"),
        format!("Verify the {event} event reaches the dataLayer with ecommerce data"),
        format!("Confirm {event} appears in GA4 DebugView"),
    ];

    if config.platform == RepairPlatform::Shopify {
        let (code, location, trigger) = liquid_event(signal);
        return Template {
            snippets: vec![snippet("liquid", SnippetLanguage::Liquid, code)],
            install_location: location.to_string(),
            trigger_condition: Some(trigger.to_string()),
            testing_steps,
        };
    }

    let (body, location) = generic_event(signal);
    Template {
        snippets: vec![generic_script("generic", body, config)],
        install_location: location.to_string(),
        trigger_condition: None,
        testing_steps,
    }
}
