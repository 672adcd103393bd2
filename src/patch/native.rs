//! Fill-file writer using the NetCDF library directly.

use netcdf::AttributeValue;

use crate::error::{Error, Result};

use super::fill::{variable_meta, FillJob, FillPlan};

const TIME: &str = "time";

pub fn write_fill_file(plan: &FillPlan, job: &FillJob) -> Result<()> {
    let template = netcdf::open(&plan.template)?;

    // Grid of the first gridded, time-varying variable.
    let gridded = template
        .variables()
        .find(|var| {
            let dims = var.dimensions();
            dims.len() == 3 && dims.iter().any(|d| d.name() == TIME)
        })
        .ok_or_else(|| {
            Error::Config(format!(
                "template '{}' has no (time, y, x) variable",
                plan.template.display()
            ))
        })?;
    let spatial: Vec<(String, usize)> = gridded
        .dimensions()
        .iter()
        .filter(|d| d.name() != TIME)
        .map(|d| (d.name(), d.len()))
        .collect();
    let (ny, nx) = (spatial[0].1, spatial[1].1);

    if let Some(parent) = job.output.parent() {
        std::fs::create_dir_all(parent).map_err(|err| Error::io(parent, err))?;
    }
    let mut file = netcdf::create(&job.output)?;

    for attr in template.attributes() {
        file.add_attribute(attr.name(), attr.value()?)?;
    }

    file.add_unlimited_dimension(TIME)?;
    for dim in template.dimensions() {
        if dim.name() != TIME && !dim.is_unlimited() {
            file.add_dimension(&dim.name(), dim.len())?;
        }
    }

    // Coordinates, bounds and grid mappings: anything not varying in time.
    for var in template.variables() {
        let dims: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
        if dims.iter().any(|d| d == TIME) {
            continue;
        }
        let dim_refs: Vec<&str> = dims.iter().map(String::as_str).collect();
        let values: Vec<f64> = var.get_values(..)?;
        let mut out = file.add_variable::<f64>(&var.name(), &dim_refs)?;
        for attr in var.attributes() {
            if attr.name() == "_FillValue" {
                continue;
            }
            out.put_attribute(attr.name(), attr.value()?)?;
        }
        if !dims.is_empty() {
            out.put_values(&values, ..)?;
        }
    }

    let n = plan.axis.len();
    {
        let mut time = file.add_variable::<f64>(TIME, &[TIME])?;
        time.put_attribute("standard_name", "time")?;
        time.put_attribute("units", plan.axis.units.as_str())?;
        time.put_attribute("calendar", plan.axis.calendar.cf_name())?;
        time.put_values(&plan.axis.values, 0..n)?;
    }

    {
        let dims = [TIME, spatial[0].0.as_str(), spatial[1].0.as_str()];
        let fill = plan.fill_value as f32;
        let mut data = file.add_variable::<f32>(&job.variable, &dims)?;
        data.put_attribute("_FillValue", fill)?;
        data.put_attribute("missing_value", AttributeValue::Float(fill))?;
        if let Some(meta) = variable_meta(&job.variable) {
            data.put_attribute("standard_name", meta.standard_name)?;
            data.put_attribute("long_name", meta.long_name)?;
            data.put_attribute("units", meta.units)?;
        }
        let values = vec![fill; n * ny * nx];
        data.put_values(&values, [0..n, 0..ny, 0..nx])?;
    }

    Ok(())
}
