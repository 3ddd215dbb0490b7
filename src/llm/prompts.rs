//! Prompt templates for the two research calls. The field names and the
//! 1995-2015 window are part of the data contract with the structuring step.

use crate::error::Result;
use crate::master::CompanyContextRow;

/// Research prompt for the web-search call.
pub fn web_search_prompt(company_name: &str, international_name: &str) -> String {
    format!(
        r#"Research in the web the history of ownership of the indian company "{company_name}", internationally known as "{international_name}"

Task:
Web search the following information by year, from the year 1995 to 2015:

- 'company_name'. Track if the company name changed, and change it according to year.
- 'company_international_name'. The company international name.
- 'establishment_year'. The establishment year of the company.
- 'parent_company_name_orbis'. The name of the direct parent company if it's a subsidiary. Consider that parent companies can be part of Joint ventures. List all the direct parent companies for a given acquisition.
- 'parent_company_ownership_years'. Ownership Dates in years. From which year to which year the parent company had ownership of the subsidiary. The range years can go before 1995 and beyond 2015. Only the years, no text. Format examples: 1992-2021, 1995-2010, 2000-2015+, 2000-2000.
- 'parent_company_country'. The country of the headquarters of the parent company.
- 'JV'. 1 if it's Joint Venture, 0 if not.
- 'GUO'. The name of the Global Ultimate Owner if it's a subsidiary. In case of a Joint Venture, the part with more ownership. In case of 50:50 ownership, return the 2 parent companies with 50 percent share, write both.
- 'GUO_country'. The country of the headquarters of the GUO company or companies.
- 'sources'. the url of the online sources that you used to extract the information.

Output:
- Return a markdown text file with the information.
"#
    )
}

/// Structuring prompt: merges the web-search findings into the company's
/// structured rows and asks for plain JSON back.
pub fn structuring_prompt(llm_text: &str, context: &[CompanyContextRow]) -> Result<String> {
    let json_sample = serde_json::to_string(context)?;
    Ok(format!(
        r#"You are given:
1. The company data: {llm_text}
2. A table in JSON format: {json_sample}

Task:
- Insert the information from the string into the table.
- The years covered are from 1995 to 2015.
- Keep and populate these columns:
  ['year', 'company_name', 'company_international_name', 'establishment_year',
  'parent_company_name_orbis', 'parent_company_country', 'JV', 'GUO',
  'GUO_country', 'parent_company_ownership_years', 'sources'].

Formatting rules:
- If multiple values exist for the following fields use list notation: parent_company_name_orbis, parent_company_country, GUO, GUO_country, 'parent_company_ownership_years'. Examples: ["Parent Company 1", "Parent Company 2"], [India, USA], [1992-2021, 1995-2010].
- 'company_name', 'company_international_name', and 'parent_company_name' company and parent company naming of the output have to match the naming of the table in JSON format.
- Output a valid and readable JSON — not code.

Output:
- Only the final JSON with the updated columns and years, from 1995 to 2015.
- No comment, output should be a readable JSON file.
"#
    ))
}
