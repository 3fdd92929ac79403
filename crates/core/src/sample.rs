/// Fixed example used by the "load sample" action.
pub const SAMPLE_TEXT: &str = "\
Northwind Semiconductor (NASDAQ: NWSC) reported third-quarter revenue of $8.2 billion, up 31% \
year over year and ahead of the $7.6 billion consensus, driven by record data-center accelerator \
shipments. Gross margin expanded 240 basis points to 64.1% as the new 3nm product line ramped. \
CEO Maria Chen said hyperscaler demand \"continues to outstrip supply\" and raised full-year \
guidance to $31 billion.

The outlook was not without caveats. CFO David Okafor flagged tighter U.S. export controls on \
advanced chips to China, which accounted for 14% of sales last year, and warned that memory \
component costs could pressure margins in the first half of next year. Inventory rose 18% \
sequentially.

Peer Cobalt Micro (CBLT) fell 3% in after-hours trading on fears of share loss, while the broader \
semiconductor sector ETF gained 1.2%. Copper prices edged higher on expectations of further \
data-center construction. Analysts at Harbor Capital reiterated a Buy rating with a $210 price \
target.";
