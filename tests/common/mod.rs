#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

pub const ORDERS: &str = "\
order_id,customer_id,order_status,order_purchase_timestamp
o1,c1,delivered,2017-06-15 14:30:00
o2,c2,delivered,2017-06-17 09:05:00
o3,c1,delivered,2018-01-07 20:00:00
o4,c3,canceled,2018-03-05 11:00:00
o5,c4,delivered,2015-12-31 10:00:00
o6,c5,delivered,2017-06-16 08:00:00
";

/// o2's price is `NA`; the mean of the other prices is exactly 24.00.
pub const ORDER_ITEMS: &str = "\
order_id,order_item_id,product_id,price
o1,1,p1,10.00
o1,2,p2,20.50
o2,1,p1,NA
o3,1,p3,5.25
o4,1,p4,100.00
o5,1,p1,1.25
o9,1,p1,7.00
";

/// p3 has no category and takes the smallest of the tied modes.
pub const PRODUCTS: &str = "\
product_id,product_category_name,product_weight_g
p1,beleza_saude,100
p2,esporte_lazer,
p3,,300
p4,pc_gamer,400
";

pub const TRANSLATIONS: &str = "\
product_category_name,product_category_name_english
beleza_saude,health_beauty
esporte_lazer,sports_leisure
";

pub const CUSTOMERS: &str = "\
customer_id,customer_city,customer_state
c1,sao paulo,SP
c2,campinas,SP
c3,curitiba,PR
c4,,RJ
c5,recife,PE
";

pub const PAYMENTS: &str = "\
order_id,payment_type,payment_value
o1,credit_card,30.50
o2,boleto,24.00
o3,voucher,NaN
o4,credit_card,100.00
";

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// Writes the six dataset files under `dataset/` and returns that directory.
    pub fn write_dataset(&self) -> PathBuf {
        let dir = self.temp_dir.path().join("dataset");
        fs::create_dir_all(&dir).expect("create dataset dir");
        for (name, contents) in [
            ("orders_dataset.csv", ORDERS),
            ("order_items_dataset.csv", ORDER_ITEMS),
            ("products_dataset.csv", PRODUCTS),
            ("product_category_name_translation.csv", TRANSLATIONS),
            ("customers_dataset.csv", CUSTOMERS),
            ("order_payments_dataset.csv", PAYMENTS),
        ] {
            fs::write(dir.join(name), contents).expect("write dataset file");
        }
        dir
    }
}
