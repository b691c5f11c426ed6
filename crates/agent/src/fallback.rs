//! Substitute content for when live inventory data cannot be read.

use crate::sections::SectionKind;

/// Supplies canned section text. Injected wherever a section might need to
/// stand in for an unreachable data store.
pub trait FallbackProvider: Send + Sync {
    fn canned_section(&self, kind: SectionKind) -> String;

    /// Context served when the whole store is down.
    fn canned_context(&self) -> String {
        [SectionKind::Summary, SectionKind::Product, SectionKind::Sales]
            .into_iter()
            .map(|kind| self.canned_section(kind))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Fixed sample catalog of five gaming products, labelled as sample data so
/// the model never presents it as the user's own inventory.
#[derive(Clone, Copy, Debug, Default)]
pub struct SampleDataFallback;

impl FallbackProvider for SampleDataFallback {
    fn canned_section(&self, kind: SectionKind) -> String {
        match kind {
            SectionKind::Summary => SAMPLE_SUMMARY,
            SectionKind::Product => SAMPLE_PRODUCTS,
            SectionKind::Time => SAMPLE_TIMELINE,
            SectionKind::Value => SAMPLE_VALUATION,
            SectionKind::Sales => SAMPLE_SALES,
            SectionKind::Category => SAMPLE_CATEGORIES,
        }
        .to_string()
    }
}

const SAMPLE_SUMMARY: &str = "Inventory Summary (SAMPLE DATA):
Total Products: 25
Total Categories: 5
Total Items in Stock: 342

Stock Status:
Normal Stock Items: 21
Low Stock Items: 3
Out of Stock Items: 1
Overstocked Items: 0

Financial Metrics:
Total Inventory Value: $28456.75
Total Inventory Cost: $17890.25
Total Potential Profit: $10566.50
Average Profit Margin: 42.50%

Inventory Timeline:
Oldest Product: Gaming Mouse (Added: 2023-01-15)
Newest Product: Gaming Chair (Added: 2023-12-05)

Sample Products:
- Gaming Mouse: 45 in stock, $59.99 each, total value: $2699.55
- Mechanical Keyboard: 32 in stock, $89.99 each, total value: $2879.68
- Gaming Headset: 28 in stock, $79.99 each, total value: $2239.72
- Gaming Monitor: 15 in stock, $299.99 each, total value: $4499.85
- Gaming Chair: 8 in stock, $199.99 each, total value: $1599.92

Categories:
- Gaming Peripherals: 12 products, 105 items, value: $8819.95
- Computer Components: 8 products, 87 items, value: $12456.80
- Office Equipment: 3 products, 15 items, value: $3999.85
- Networking: 2 products, 35 items, value: $3180.15";

const SAMPLE_PRODUCTS: &str = "Product Information (SAMPLE DATA):
- Gaming Mouse (SKU: GM001)
  Description: High-performance gaming mouse with RGB lighting and programmable buttons
  Category: Gaming Peripherals
  Price: $59.99
  Cost: $35.99
  Profit Margin: 66.69%
  In Stock: 45
  Total Value: $2699.55
  Potential Profit: $1080.00
  Minimum Stock: 10
  Maximum Stock: 50
  Stock Status: Normal
  Location: Warehouse A, Shelf 3
  Supplier: Gaming Gear Inc.
  Created: 2023-01-15
  Last Updated: 2023-11-20
  Status: active

- Mechanical Keyboard (SKU: KB001)
  Description: Mechanical gaming keyboard with Cherry MX switches and customizable backlighting
  Category: Gaming Peripherals
  Price: $89.99
  Cost: $52.50
  Profit Margin: 71.41%
  In Stock: 32
  Total Value: $2879.68
  Potential Profit: $1199.68
  Minimum Stock: 8
  Maximum Stock: 40
  Stock Status: Normal
  Location: Warehouse A, Shelf 2
  Supplier: Gaming Gear Inc.
  Created: 2023-02-10
  Last Updated: 2023-10-15
  Status: active

- Gaming Headset (SKU: HS001)
  Description: Surround sound gaming headset with noise-cancelling microphone
  Category: Gaming Peripherals
  Price: $79.99
  Cost: $45.00
  Profit Margin: 77.76%
  In Stock: 28
  Total Value: $2239.72
  Potential Profit: $979.72
  Minimum Stock: 5
  Maximum Stock: 30
  Stock Status: Normal
  Location: Warehouse A, Shelf 4
  Supplier: Audio Tech Ltd.
  Created: 2023-03-22
  Last Updated: 2023-11-05
  Status: active

- Gaming Monitor (SKU: MON001)
  Description: 27-inch 4K gaming monitor with 144Hz refresh rate and 1ms response time
  Category: Computer Components
  Price: $299.99
  Cost: $210.00
  Profit Margin: 42.85%
  In Stock: 15
  Total Value: $4499.85
  Potential Profit: $1349.85
  Minimum Stock: 3
  Maximum Stock: 20
  Stock Status: Normal
  Location: Warehouse B, Shelf 1
  Supplier: Display Solutions
  Created: 2023-06-15
  Last Updated: 2023-12-01
  Status: active

- Gaming Chair (SKU: CH001)
  Description: Ergonomic gaming chair with adjustable armrests and lumbar support
  Category: Office Equipment
  Price: $199.99
  Cost: $120.00
  Profit Margin: 66.66%
  In Stock: 8
  Total Value: $1599.92
  Potential Profit: $639.92
  Minimum Stock: 5
  Maximum Stock: 15
  Stock Status: Low Stock
  Location: Warehouse C, Shelf 2
  Supplier: Comfort Seating Co.
  Created: 2023-12-05
  Last Updated: 2023-12-05
  Status: active

Product Age Information:
Oldest Product: Gaming Mouse (Created: 2023-01-15)
Newest Product: Gaming Chair (Created: 2023-12-05)";

const SAMPLE_TIMELINE: &str = "Inventory Timeline (SAMPLE DATA):
Oldest Products:
- Gaming Mouse (Added: 2023-01-15)
- Mechanical Keyboard (Added: 2023-02-10)
- Gaming Headset (Added: 2023-03-22)
- Gaming Monitor (Added: 2023-06-15)
- Gaming Chair (Added: 2023-12-05)

Newest Products:
- Gaming Chair (Added: 2023-12-05)
- Gaming Monitor (Added: 2023-06-15)
- Gaming Headset (Added: 2023-03-22)
- Mechanical Keyboard (Added: 2023-02-10)
- Gaming Mouse (Added: 2023-01-15)

Recently Updated:
- Gaming Chair (Updated: 2023-12-05)
- Gaming Monitor (Updated: 2023-12-01)
- Gaming Mouse (Updated: 2023-11-20)
- Gaming Headset (Updated: 2023-11-05)
- Mechanical Keyboard (Updated: 2023-10-15)";

const SAMPLE_VALUATION: &str = "Inventory Value Analysis (SAMPLE DATA):
Total Inventory Value: $13918.72
Total Inventory Cost: $8669.55
Total Potential Profit: $5249.17

Top Products by Stock Value:
- Gaming Monitor: $4499.85 (15 x $299.99)
- Mechanical Keyboard: $2879.68 (32 x $89.99)
- Gaming Mouse: $2699.55 (45 x $59.99)
- Gaming Headset: $2239.72 (28 x $79.99)
- Gaming Chair: $1599.92 (8 x $199.99)

Most Expensive Product: Gaming Monitor ($299.99)
Least Expensive Product: Gaming Mouse ($59.99)
Highest Profit Margin: Gaming Headset (77.76%)
Lowest Profit Margin: Gaming Monitor (42.85%)";

const SAMPLE_SALES: &str = "Sales Analytics (SAMPLE DATA):
Total Sales: 156
Total Revenue: $12450.85
Average Sale Value: $79.81

Time-Based Analytics:
Today: 3 sales, $245.97 revenue
Last 7 Days: 18 sales, $1456.25 revenue
Last 30 Days: 42 sales, $3245.75 revenue
First Sale: 2023-01-20
Latest Sale: 2023-12-10

Payment Methods:
- Credit Card: 98 sales (62.8%)
- Cash: 35 sales (22.4%)
- Bank Transfer: 18 sales (11.5%)
- Other: 5 sales (3.2%)

Top Selling Products:
- Gaming Mouse: 35 sales, $2099.65 revenue
- Mechanical Keyboard: 28 sales, $2519.72 revenue
- Gaming Headset: 22 sales, $1759.78 revenue
- Gaming Monitor: 15 sales, $4499.85 revenue
- Gaming Chair: 12 sales, $2399.88 revenue

Top Products by Revenue:
- Gaming Monitor: $4499.85 revenue, 15 sales
- Mechanical Keyboard: $2519.72 revenue, 28 sales
- Gaming Chair: $2399.88 revenue, 12 sales
- Gaming Mouse: $2099.65 revenue, 35 sales
- Gaming Headset: $1759.78 revenue, 22 sales

Top Categories by Revenue:
- Computer Components: $6589.75 revenue, 25 sales
- Gaming Peripherals: $6379.15 revenue, 85 sales
- Office Equipment: $2399.88 revenue, 12 sales";

const SAMPLE_CATEGORIES: &str = "Categories (SAMPLE DATA):
- Gaming Peripherals: 12 products
- Computer Components: 8 products
- Office Equipment: 3 products
- Networking: 2 products";

#[cfg(test)]
mod tests {
    use super::{FallbackProvider, SampleDataFallback};
    use crate::sections::SectionKind;

    #[test]
    fn every_section_kind_has_labelled_sample_text() {
        let fallback = SampleDataFallback;
        for kind in SectionKind::ALL {
            let text = fallback.canned_section(kind);
            assert!(text.contains("(SAMPLE DATA)"), "{kind:?} should be labelled");
        }
    }

    #[test]
    fn canned_context_is_summary_product_then_sales() {
        let context = SampleDataFallback.canned_context();

        let summary = context.find("Inventory Summary (SAMPLE DATA)").expect("summary");
        let product = context.find("Product Information (SAMPLE DATA)").expect("product");
        let sales = context.find("Sales Analytics (SAMPLE DATA)").expect("sales");
        assert!(summary < product && product < sales);
        assert!(!context.contains("Categories (SAMPLE DATA)"));
    }
}
