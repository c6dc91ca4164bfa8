#![allow(dead_code)]

use std::fs;
use std::path::Path;

pub const SERIES_MATRIX: &str = "!Series_title\t\"Methylation in whole blood\"
!Series_geo_accession\t\"GSE41037\"

!Sample_title\t\"control 1\"\t\"case 1\"\t\"case 2\"
!Sample_geo_accession\t\"GSM1007129\"\t\"GSM1007130\"\t\"GSM1007131\"
!Sample_status\t\"Public\"\t\"Public\"\t\"Public\"
!Sample_characteristics_ch1\t\"gender: male\"\t\"gender: female\"\t\"gender: female\"
!Sample_characteristics_ch1\t\"age: 45 years\"\t\"age: 6 months\"\t\"age: newborn\"
!Sample_characteristics_ch1\t\"disease state: rheumatoid arthritis\"\t\"disease state: normal\"\t\"tissue: blood\"
!Sample_characteristics_ch1\t\"brca1 mutation status: 1\"\t\"brca1 mutation status: 0\"\t\"\"
!Sample_data_row_count\t\"3\"\t\"3\"\t\"3\"
!series_matrix_table_begin
\"ID_REF\"\t\"GSM1007129\"\t\"GSM1007130\"\t\"GSM1007131\"
\"cg00000029\"\t0.4623\t0.5112\t0.3981
\"cg00000108\"\t0.9312\t0.9475\t0.9201
\"cg00000109\"\t0.8154\t\t0.8003
!series_matrix_table_end
";

pub fn write_matrix(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}
