//! Column names of the product sheet.

pub const GTIN: &str = "GTIN";
pub const NAME: &str = "Name";
pub const BRAND: &str = "Brand";
pub const CATEGORY: &str = "Category";
pub const PRICE_INC_SHIPPING: &str = "€ Price inc. shipping";
pub const INVENTORY: &str = "Inventory";

pub const REQUIRED: [&str; 6] = [GTIN, NAME, BRAND, CATEGORY, PRICE_INC_SHIPPING, INVENTORY];

// Added by scraping.
pub const LINK: &str = "Link";
pub const DESCRIPTION: &str = "Description";
pub const IMAGE_URL: &str = "Image_URL";
pub const SELLING_PRICE: &str = "Selling Price";

// Added by uploading.
pub const PRODUCT_ID: &str = "Product ID";
pub const UPLOAD_STATUS: &str = "Upload Status";

pub const SCRAPED: [&str; 4] = [LINK, DESCRIPTION, IMAGE_URL, SELLING_PRICE];
pub const UPLOADED: [&str; 2] = [PRODUCT_ID, UPLOAD_STATUS];
